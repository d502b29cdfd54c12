//! In-page scripts run through `execute/sync`
//!
//! Each script is a function body; `arguments[i]` are the values passed with
//! the command. Every script catches its own failures so one broken
//! selector strategy cannot abort the others.

/// Tag every suggested option with its index, then click option `arguments[0]`
///
/// `arguments[1]` is the option selector. Returns whether a click happened.
pub(crate) const CLICK_OPTION: &str = r"
const index = arguments[0];
const options = Array.from(document.querySelectorAll(arguments[1]));
options.forEach((el, i) => el.setAttribute('data-option-index', String(i)));
const target = options[index];
if (!target) {
  return false;
}
target.scrollIntoView({ block: 'center' });
(target.querySelector('a, button, [role=button]') || target).click();
return true;
";

/// Expand every collapsed "N stops" widget; returns how many were clicked
pub(crate) const EXPAND_STOPS: &str = r"
const seen = new Set();
let clicked = 0;
const press = (el) => {
  if (!el || seen.has(el)) {
    return;
  }
  seen.add(el);
  try {
    el.click();
    clicked += 1;
  } catch (e) {}
};

try {
  document
    .querySelectorAll('[aria-expanded=false], [class*=collapsed], [class*=stops-toggle], [class*=expand]')
    .forEach(press);
} catch (e) {}

try {
  const stopsText = /^\s*\d+\s+(paradas?|stops?|estaciones|stations)\s*$/i;
  document.querySelectorAll('span, button, div, a').forEach((el) => {
    if (el.children.length === 0 && el.offsetParent !== null && stopsText.test(el.textContent || '')) {
      press(el.closest('button, [role=button], a') || el);
    }
  });
} catch (e) {}

try {
  document.querySelectorAll('details:not([open])').forEach((el) => {
    el.open = true;
    clicked += 1;
  });
} catch (e) {}

return clicked;
";

/// Scroll to the bottom to trigger lazy loading; returns the page height
pub(crate) const SCROLL_TO_BOTTOM: &str = r"
const height = Math.max(document.body.scrollHeight, document.documentElement.scrollHeight);
window.scrollTo(0, height);
return height;
";

/// Scan the page for stop codes, metro lines and route numbers and record
/// them on a hidden marker element
///
/// `arguments[0]` is the option index, `arguments[1]` an object with the
/// marker `id` and the attribute names `option`, `stops`, `metro`, `routes`.
/// Returns the findings.
pub(crate) const INJECT_MARKER: &str = r"
const optionIndex = arguments[0];
const names = arguments[1];
const unique = (values) => Array.from(new Set(values));
const all = (text, pattern, group) => {
  const out = [];
  for (const m of (text || '').matchAll(pattern)) {
    out.push(m[group].toUpperCase());
  }
  return out;
};

const text = document.body ? document.body.innerText : '';
const html = document.documentElement ? document.documentElement.outerHTML : '';
const stopPattern = /\b(P[A-Z]\d{1,5})\b/gi;
const linePattern = /\b(?:l[ií]nea|line)\s*(\d{1,2}[a-z]?)\b/gi;

const stops = unique(all(text, stopPattern, 1).concat(all(html, stopPattern, 1)));

let metro = all(text, linePattern, 1).map((n) => 'L' + n);
try {
  document.querySelectorAll('[data-metro], [data-metro-line]').forEach((el) => {
    const value = el.getAttribute('data-metro') || el.getAttribute('data-metro-line') || '';
    const m = value.match(/^\s*l?(\d{1,2}[a-z]?)\s*$/i);
    if (m) {
      metro.push('L' + m[1].toUpperCase());
    }
  });
} catch (e) {}
metro = unique(metro);

let routes = [];
try {
  document.querySelectorAll('[data-line], [class*=route-label], [class*=service-label]').forEach((el) => {
    const value = (el.getAttribute('data-line') || el.textContent || '').trim();
    if (/^[a-z]?\d{2,3}[a-z]?$/i.test(value)) {
      routes.push(value.toUpperCase());
    }
  });
} catch (e) {}
routes = unique(routes);

const previous = document.getElementById(names.id);
if (previous) {
  previous.remove();
}
const marker = document.createElement('div');
marker.id = names.id;
marker.style.display = 'none';
marker.setAttribute(names.option, String(optionIndex));
marker.setAttribute(names.stops, stops.join(','));
marker.setAttribute(names.metro, metro.join(','));
marker.setAttribute(names.routes, routes.join(','));
document.body.appendChild(marker);

return { stops, metro, routes };
";
