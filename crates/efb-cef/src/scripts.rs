//! JavaScript injected into the page.

use crate::host::LocationFix;
use std::fmt::Write;

/// Clears focus from whatever element holds it.
pub const BLUR_ACTIVE_ELEMENT: &str = "document.activeElement?.blur();";

/// Replaces the geolocation API with watchers fed by [`location_push`].
pub const GEOLOCATION_SHIM: &str = r#"
window.efb_watchers = {};
navigator.permissions.query = (options) => Promise.resolve({ state: "granted" });

navigator.geolocation.watchPosition = (success, error, options) => {
  window.efb_watchers = (window.efb_watchers || {});
  const id = Math.round(Date.now() / 1000) + Math.random();
  window.efb_watchers[id] = success;
  return id;
};

navigator.geolocation.clearWatch = (id) => {
  if (!window.efb_watchers) { return; }
  delete window.efb_watchers[id];
};

navigator.geolocation.getCurrentPosition = (success, error, options) => {
  const wid = navigator.geolocation.watchPosition(() => {
    success(window.efb_location || null);
    navigator.geolocation.clearWatch(wid);
  }, error, options);
};
"#;

/// Publish `fix` as `window.efb_location` and notify every watcher.
pub fn location_push(fix: &LocationFix) -> String {
    let mut js = String::with_capacity(320);
    let _ = write!(
        js,
        "window.efb_location = {{ coords: {{ latitude: {:.6}, longitude: {:.6}, accuracy: 10, \
         altitude: {:.0}, altitudeAccuracy: 10, heading: {:.0}, speed: {:.0} }}, timestamp: Date.now() }}; \
         for (let key in window.efb_watchers) {{ window.efb_watchers[key](window.efb_location); }}",
        fix.latitude, fix.longitude, fix.altitude_m, fix.heading_deg, fix.speed_mps
    );
    js
}

const DISABLED_FILTER: &str = "brightness(1.5) saturate(0)";

const ADDRESS_BAR_BODY: &str = r##"
  const dark = window.matchMedia('(prefers-color-scheme: dark)').matches;
  const chevron = 'data:image/svg+xml;charset=UTF-8,' + encodeURIComponent('<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 14"><path fill="#007AFF" d="M0 7l7-7 1.5 1.5L3 7l5.5 5.5L7 14z"/></svg>');

  const bar = document.createElement('div');
  bar.id = 'efbToolbar';
  bar.style.cssText = 'position:fixed;top:0;left:0;width:100%;z-index:9999;padding:4px;' +
    'box-sizing:border-box;display:flex;align-items:center;gap:8px;background:' + (dark ? '#1A1A1A' : '#EEE');

  const nav = (id, flip, action) => {
    const btn = document.createElement('button');
    btn.id = id;
    btn.style.cssText = 'width:14px;height:14px;border:none;outline:none;cursor:pointer;' +
      'background:url(' + chevron + ') no-repeat center / contain;' + (flip ? 'transform:scaleX(-1);' : '');
    btn.onclick = action;
    return btn;
  };
  const back = nav('efbBack', false, () => window.history.back());
  const forward = nav('efbForward', true, () => window.history.forward());

  const address = document.createElement('input');
  address.type = 'text';
  address.id = 'efbAddressBar';
  address.value = window.location.href;
  address.style.cssText = 'flex:1;font-size:12px;height:20px;border:none;outline:none;padding:2px 8px;border-radius:12px;' +
    (dark ? 'color:#D2D2D2;background:#000' : 'color:#1A1A1A;background:#D2D2D2');
  address.addEventListener('keydown', (e) => { if (e.key === 'Enter') { window.location.href = address.value; } });
  address.addEventListener('blur', () => { if (address.value === '') { address.value = window.location.href; } });

  const reload = document.createElement('button');
  reload.innerHTML = '&#8635;';
  reload.style.cssText = 'border:none;outline:none;background:transparent;cursor:pointer;font-size:14px;color:#999';
  reload.onclick = () => window.location.reload();

  bar.append(back, forward, address, reload);
  document.body.insertBefore(bar, document.body.firstChild);
  document.body.style.marginTop = '40px';
"##;

/// Address bar overlay with back/forward/reload. When the bar already
/// exists only the back/forward enablement is refreshed.
pub fn address_bar(can_go_back: bool, can_go_forward: bool) -> String {
    let filter = |enabled: bool| if enabled { "" } else { DISABLED_FILTER };
    let mut js = String::with_capacity(ADDRESS_BAR_BODY.len() + 512);
    let _ = write!(
        js,
        "(function() {{\n  const paint = () => {{\n    document.getElementById('efbBack').style.filter = '{back}';\n    \
         document.getElementById('efbForward').style.filter = '{forward}';\n  }};\n  \
         if (document.getElementById('efbToolbar')) {{ paint(); return; }}\n  if (!document.body) {{ return; }}\n{body}  paint();\n}})();",
        back = filter(can_go_back),
        forward = filter(can_go_forward),
        body = ADDRESS_BAR_BODY,
    );
    js
}
