//! Editor page assembly.
//!
//! The content surface runs a self-contained HTML page: the rich-text
//! editor, the document converters, and the glue script implementing the
//! import/export entry points the host calls by name.
//!
//! # Page Script Interface
//!
//! | Function | Returns |
//! |----------|---------|
//! | `importDocxFromBase64(b64)` | `true` on success, `false` on conversion failure |
//! | `importRtfFromBase64(b64)` | `true` on success, `false` on conversion failure |
//! | `exportDocx()` | base64 docx, `''` on failure |
//! | `exportRtf()` | base64 rtf, `''` on failure |
//!
//! The page pushes `{"type":"saveImage","dataUrl":...}` through
//! `nativePostMessage`, which tries each native transport in turn.

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::Path;

use tracing::{debug, trace};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// File names looked up by [`EditorAssets::from_dir`].
pub mod file_names {
    /// Editor stylesheet.
    pub const EDITOR_CSS: &str = "quill.snow.css";
    /// Editor script.
    pub const EDITOR_JS: &str = "quill.min.js";
    /// docx to html converter.
    pub const DOCX_TO_HTML_JS: &str = "mammoth.browser.min.js";
    /// html to docx converter.
    pub const HTML_TO_DOCX_JS: &str = "html-docx.js";
    /// Optional rtf to html converter.
    pub const RTF_TO_HTML_JS: &str = "rtf-to-html.min.js";
}

// ============================================================================
// EditorAssets
// ============================================================================

/// Sources of the libraries inlined into the editor page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorAssets {
    /// Editor stylesheet.
    pub editor_css: String,
    /// Editor script. Must define `Quill`.
    pub editor_js: String,
    /// docx to html converter. Must define `mammoth`.
    pub docx_to_html_js: String,
    /// html to docx converter. Must define `htmlDocx`.
    pub html_to_docx_js: String,
    /// Optional rtf to html converter. If present, must define `rtfToHtml`.
    pub rtf_to_html_js: Option<String>,
}

impl EditorAssets {
    /// Creates assets from the required library sources.
    #[must_use]
    pub fn new(
        editor_css: impl Into<String>,
        editor_js: impl Into<String>,
        docx_to_html_js: impl Into<String>,
        html_to_docx_js: impl Into<String>,
    ) -> Self {
        Self {
            editor_css: editor_css.into(),
            editor_js: editor_js.into(),
            docx_to_html_js: docx_to_html_js.into(),
            html_to_docx_js: html_to_docx_js.into(),
            rtf_to_html_js: None,
        }
    }

    /// Adds the optional rtf converter.
    #[inline]
    #[must_use]
    pub fn with_rtf_to_html(mut self, source: impl Into<String>) -> Self {
        self.rtf_to_html_js = Some(source.into());
        self
    }

    /// Loads assets from a directory using the names in [`file_names`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a required file is missing
    /// - [`Error::Io`] if a file exists but cannot be read
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let required = |name: &str| -> Result<String> {
            let path = dir.join(name);
            if !path.is_file() {
                return Err(Error::config(format!(
                    "Editor asset '{name}' not found in {}",
                    dir.display()
                )));
            }
            Ok(fs::read_to_string(path)?)
        };

        let rtf_path = dir.join(file_names::RTF_TO_HTML_JS);
        let rtf_to_html_js = if rtf_path.is_file() {
            Some(fs::read_to_string(rtf_path)?)
        } else {
            trace!(dir = %dir.display(), "No rtf converter asset");
            None
        };

        let assets = Self {
            editor_css: required(file_names::EDITOR_CSS)?,
            editor_js: required(file_names::EDITOR_JS)?,
            docx_to_html_js: required(file_names::DOCX_TO_HTML_JS)?,
            html_to_docx_js: required(file_names::HTML_TO_DOCX_JS)?,
            rtf_to_html_js,
        };
        debug!(dir = %dir.display(), "Editor assets loaded");
        Ok(assets)
    }

    /// Checks that every required source is present.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] naming the first blank required asset
    pub fn validate(&self) -> Result<()> {
        let required = [
            (file_names::EDITOR_CSS, &self.editor_css),
            (file_names::EDITOR_JS, &self.editor_js),
            (file_names::DOCX_TO_HTML_JS, &self.docx_to_html_js),
            (file_names::HTML_TO_DOCX_JS, &self.html_to_docx_js),
        ];

        match required.iter().find(|(_, source)| source.trim().is_empty()) {
            Some((name, _)) => Err(Error::config(format!("Editor asset '{name}' is empty"))),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Public Functions
// ============================================================================

/// Assembles the editor page.
///
/// # Errors
///
/// - [`Error::Config`] if a required asset is missing
pub fn build_editor_html(assets: &EditorAssets, disable_context_menu: bool) -> Result<String> {
    assets.validate()?;

    let rtf = assets
        .rtf_to_html_js
        .as_deref()
        .filter(|source| !source.trim().is_empty());

    let mut html = String::with_capacity(
        PAGE_HEAD.len()
            + assets.editor_css.len()
            + assets.editor_js.len()
            + assets.docx_to_html_js.len()
            + assets.html_to_docx_js.len()
            + rtf.map_or(0, str::len)
            + APP_SCRIPT.len()
            + 256,
    );

    html.push_str(PAGE_HEAD);
    push_element(&mut html, "style", &assets.editor_css);
    html.push_str(PAGE_BODY);
    push_element(&mut html, "script", &assets.editor_js);
    push_element(&mut html, "script", &assets.docx_to_html_js);
    push_element(&mut html, "script", &assets.html_to_docx_js);
    if let Some(rtf) = rtf {
        push_element(&mut html, "script", rtf);
    }

    html.push_str("<script>\n");
    html.push_str(&format!(
        "const DISABLE_CONTEXT_MENU = {disable_context_menu};\n"
    ));
    html.push_str(APP_SCRIPT);
    html.push_str("</script>\n</body>\n</html>\n");

    debug!(
        len = html.len(),
        rtf_converter = rtf.is_some(),
        disable_context_menu,
        "Editor page assembled"
    );
    Ok(html)
}

// ============================================================================
// Internal Functions
// ============================================================================

/// Appends `<tag>body</tag>`.
fn push_element(html: &mut String, tag: &str, body: &str) {
    html.push('<');
    html.push_str(tag);
    html.push('>');
    html.push_str(body);
    html.push_str("</");
    html.push_str(tag);
    html.push_str(">\n");
}

// ============================================================================
// Templates
// ============================================================================

/// Document head up to the library stylesheet.
const PAGE_HEAD: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<style>
html,body{height:100%;margin:0;padding:0;background:#ffffff;}
body{display:flex;flex-direction:column;}
#editor{flex:1;min-height:0;}
.wf-img-menu{position:fixed;z-index:9999;background:#fff;border:1px solid #ccc;box-shadow:0 2px 6px rgba(0,0,0,.25);border-radius:4px;font:14px -apple-system,Segoe UI,Arial,sans-serif;min-width:150px;padding:4px;display:none;}
.wf-img-menu button{all:unset;display:block;width:100%;padding:6px 10px;cursor:pointer;border-radius:3px;}
.wf-img-menu button:hover{background:#e6f0ff;}
</style>
"##;

/// Closes the head and lays out the editor container and image menu.
const PAGE_BODY: &str = r##"</head>
<body>
<div id="editor"></div>
<div class="wf-img-menu" id="wfImgMenu"><button data-action="save">Save Image...</button></div>
"##;

/// Glue script. Expects `DISABLE_CONTEXT_MENU` to be declared before it.
const APP_SCRIPT: &str = r##"function nativePostMessage(message) {
  try {
    if (window.chrome?.webview?.postMessage) window.chrome.webview.postMessage(message);
    else if (window.webkit?.messageHandlers?.invokeAction) window.webkit.messageHandlers.invokeAction.postMessage(message);
    else if (window.native?.postMessage) window.native.postMessage(message);
  } catch (e) {}
}

if (DISABLE_CONTEXT_MENU) {
  window.addEventListener('contextmenu', e => e.preventDefault(), false);
}

var quill = new Quill('#editor', {
  theme: 'snow',
  modules: {
    toolbar: [
      [{ header: [1, 2, 3, false] }],
      ['bold', 'italic', 'underline', 'strike'],
      [{ color: [] }, { background: [] }],
      [{ list: 'ordered' }, { list: 'bullet' }],
      [{ align: [] }],
      ['link', 'image'],
      ['blockquote', 'code-block'],
      ['clean']
    ]
  }
});

const menu = document.getElementById('wfImgMenu');
function hideMenu() {
  menu.style.display = 'none';
  document.removeEventListener('click', hideMenu, true);
}
function showMenu(x, y, img) {
  menu.style.display = 'block';
  const r = menu.getBoundingClientRect();
  if (x + r.width > innerWidth) x = innerWidth - r.width - 4;
  if (y + r.height > innerHeight) y = innerHeight - r.height - 4;
  menu.style.left = x + 'px';
  menu.style.top = y + 'px';
  document.addEventListener('click', hideMenu, true);
  menu.onclick = ev => {
    const btn = ev.target.closest('button');
    if (!btn) return;
    if (btn.getAttribute('data-action') === 'save') {
      try {
        const c = document.createElement('canvas');
        c.width = img.naturalWidth || img.width;
        c.height = img.naturalHeight || img.height;
        c.getContext('2d').drawImage(img, 0, 0);
        const dataUrl = c.toDataURL('image/png');
        nativePostMessage(JSON.stringify({ type: 'saveImage', dataUrl }));
      } catch (e) {}
      hideMenu();
    }
  };
}
document.addEventListener('contextmenu', e => {
  const t = e.target;
  if (t && t.tagName === 'IMG') {
    e.preventDefault();
    showMenu(e.clientX, e.clientY, t);
  }
}, false);

function base64ToBytes(b64) {
  const bin = atob(b64);
  const bytes = new Uint8Array(bin.length);
  for (let i = 0; i < bin.length; i++) bytes[i] = bin.charCodeAt(i);
  return bytes;
}

function blobToBase64(blob) {
  return new Promise((resolve, reject) => {
    const fr = new FileReader();
    fr.onloadend = () => resolve(fr.result.split(',')[1]);
    fr.onerror = reject;
    fr.readAsDataURL(blob);
  });
}

window.importDocxFromBase64 = async function (b64) {
  try {
    const result = await mammoth.convertToHtml({ arrayBuffer: base64ToBytes(b64).buffer });
    quill.root.innerHTML = result.value || '<p><em>No content</em></p>';
    return true;
  } catch (e) {
    return false;
  }
};

window.importRtfFromBase64 = async function (b64) {
  try {
    const rtf = atob(b64);
    if (typeof window.rtfToHtml === 'function') {
      quill.root.innerHTML = await window.rtfToHtml(rtf);
      return true;
    }
    let plain = rtf
      .replace(/\\'[0-9a-fA-F]{2}/g, ' ')
      .replace(/\\par/gi, '\n')
      .replace(/\\[a-zA-Z]+-?\d* ?/g, '')
      .replace(/[{}]/g, '')
      .trim();
    if (!plain) plain = '(empty)';
    quill.root.innerHTML = '<p>' + plain.replace(/\n+/g, '</p><p>') + '</p>';
    return true;
  } catch (e) {
    return false;
  }
};

window.exportDocx = async function () {
  try {
    const blob = htmlDocx.asBlob('<html><body>' + quill.root.innerHTML + '</body></html>');
    return await blobToBase64(blob);
  } catch (e) {
    return '';
  }
};

window.exportRtf = function () {
  try {
    const txt = quill.getText()
      .replace(/\\/g, '\\\\')
      .replace(/\{/g, '\\{')
      .replace(/\}/g, '\\}')
      .replace(/\r?\n/g, '\\par ');
    const rtf = '{\\rtf1\\ansi\\deff0 ' + txt + '}';
    return btoa(unescape(encodeURIComponent(rtf)));
  } catch (e) {
    return '';
  }
};
"##;

// ============================================================================
// Tests
// ============================================================================
