//! In-page JavaScript evaluated through agent-browser
//!
//! Every program shares one prelude that resolves a [`Locator`] to DOM
//! elements the way the accessibility tree would name them. The locator is
//! embedded as JSON, so selectors and names never need escaping.

use std::time::Duration;

use crate::core::{Condition, Locator};

/// Attribute stamped on the element a native command should act on
pub const TARGET_ATTR: &str = "data-pagecheck-target";

/// How often the in-page wait re-checks its predicate
const POLL_INTERVAL_MS: u64 = 100;

const PRELUDE: &str = r#"
const loc = __LOCATOR__;
const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
const IMPLICIT_ROLES = {
  article: 'article',
  banner: 'header',
  button: 'button,input[type=button],input[type=submit],input[type=reset]',
  checkbox: 'input[type=checkbox]',
  contentinfo: 'footer',
  form: 'form',
  heading: 'h1,h2,h3,h4,h5,h6',
  img: 'img[alt]',
  link: 'a[href],area[href]',
  list: 'ul,ol',
  listitem: 'li',
  main: 'main',
  navigation: 'nav',
  region: 'section[aria-label],section[aria-labelledby]',
  textbox: 'input:not([type]),input[type=text],input[type=email],input[type=search],textarea',
};
const textMatches = (value, expected, exact) => {
  const v = norm(value);
  const e = norm(expected);
  return exact ? v === e : v.toLowerCase().includes(e.toLowerCase());
};
const accessibleName = (el) => {
  const label = el.getAttribute('aria-label');
  if (label) return label;
  const labelledBy = el.getAttribute('aria-labelledby');
  if (labelledBy) {
    return labelledBy.split(/\s+/)
      .map((id) => { const ref = document.getElementById(id); return ref ? ref.textContent : ''; })
      .join(' ');
  }
  if (el.tagName === 'IMG') return el.getAttribute('alt') || '';
  return el.textContent || el.getAttribute('title') || '';
};
const resolve = () => {
  switch (loc.by) {
    case 'css':
      return Array.from(document.querySelectorAll(loc.selector));
    case 'role': {
      const implicit = IMPLICIT_ROLES[loc.role];
      const selector = `[role="${loc.role}"]` + (implicit ? ',' + implicit : '');
      let els = Array.from(document.querySelectorAll(selector))
        .filter((el) => !el.hasAttribute('role') || el.getAttribute('role') === loc.role);
      if (loc.name != null) els = els.filter((el) => textMatches(accessibleName(el), loc.name, loc.exact));
      return els;
    }
    case 'text': {
      const skip = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE']);
      const hits = Array.from(document.body.querySelectorAll('*'))
        .filter((el) => !skip.has(el.tagName) && textMatches(el.textContent, loc.text, loc.exact));
      return hits.filter((el) => !hits.some((other) => other !== el && el.contains(other)));
    }
    case 'css_text':
      return Array.from(document.querySelectorAll(loc.selector))
        .filter((el) => textMatches(el.textContent, loc.text, false));
  }
  return [];
};
const isVisible = (el) => {
  const rect = el.getBoundingClientRect();
  if (rect.width <= 0 || rect.height <= 0) return false;
  return getComputedStyle(el).visibility !== 'hidden';
};
const inViewport = (el) => {
  if (!isVisible(el)) return false;
  const r = el.getBoundingClientRect();
  return r.bottom > 0 && r.right > 0 && r.top < window.innerHeight && r.left < window.innerWidth;
};
"#;

fn program(locator: &Locator, body: &str) -> String {
    // Locator serialization cannot fail: it is plain strings and bools.
    let json = serde_json::to_string(locator).unwrap_or_else(|_| "null".to_string());
    format!(
        "(async () => {{{}{}}})()",
        PRELUDE.replace("__LOCATOR__", &json),
        body
    )
}

/// Evaluates to the number of matching elements
pub fn count(locator: &Locator) -> String {
    program(locator, "return resolve().length;\n")
}

/// Polls `condition` in the page; evaluates to `{ ok, elapsed }`
pub fn wait(condition: &Condition, timeout: Duration) -> String {
    let predicate = match condition {
        Condition::Visible(_) => "resolve().some(isVisible)",
        Condition::Hidden(_) => "!resolve().some(isVisible)",
        Condition::InViewport(_) => "resolve().some(inViewport)",
    };
    let body = format!(
        r#"
const started = performance.now();
const deadline = started + {timeout};
for (;;) {{
  if ({predicate}) return {{ ok: true, elapsed: Math.round(performance.now() - started) }};
  if (performance.now() >= deadline) return {{ ok: false, elapsed: Math.round(performance.now() - started) }};
  await new Promise((r) => setTimeout(r, {interval}));
}}
"#,
        timeout = timeout.as_millis(),
        predicate = predicate,
        interval = POLL_INTERVAL_MS,
    );
    program(condition.locator(), &body)
}

/// Marks the element for a native command when exactly one matches;
/// evaluates to the match count either way
pub fn stamp_target(locator: &Locator) -> String {
    let body = format!(
        r#"
document.querySelectorAll('[{attr}]').forEach((el) => el.removeAttribute('{attr}'));
const els = resolve();
if (els.length === 1) els[0].setAttribute('{attr}', '1');
return els.length;
"#,
        attr = TARGET_ATTR
    );
    program(locator, &body)
}

/// Scrolls the single match to the centre of the viewport; evaluates to the match count
pub fn scroll_into_view(locator: &Locator) -> String {
    program(
        locator,
        r#"
const els = resolve();
if (els.length === 1) els[0].scrollIntoView({ block: 'center', inline: 'nearest' });
return els.length;
"#,
    )
}

/// Evaluates to `{ count, x, y, width, height, dpr }` in page coordinates
pub fn element_rect(locator: &Locator) -> String {
    program(
        locator,
        r#"
const els = resolve();
if (els.length !== 1) return { count: els.length, x: 0, y: 0, width: 0, height: 0, dpr: 1 };
const r = els[0].getBoundingClientRect();
return {
  count: 1,
  x: r.left + window.scrollX,
  y: r.top + window.scrollY,
  width: r.width,
  height: r.height,
  dpr: window.devicePixelRatio || 1,
};
"#,
    )
}

/// CSS selector matching the stamped element
pub fn target_selector() -> String {
    format!("[{}=\"1\"]", TARGET_ATTR)
}
