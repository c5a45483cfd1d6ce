//! HTML rendering
//!
//! Each session becomes a small page referencing `style.css` and `script.js`
//! next to it. Rendering goes through minijinja, which escapes every value
//! because the template name ends in `.html`.

use minijinja::{context, Environment};
use std::io::Write;
use std::path::Path;

use super::Document;

pub const STYLESHEET_NAME: &str = "style.css";
pub const SCRIPT_NAME: &str = "script.js";

const TEMPLATE_NAME: &str = "session.html";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
<link rel="stylesheet" href="{{ stylesheet }}">
<script src="{{ script }}" defer></script>
</head>
<body>
<header class="chat-header"><h1>{{ title }}</h1></header>
<main class="chat">
{%- for entry in entries %}
<div class="message {{ entry.origin }}" data-timestamp="{{ entry.timestamp }}">
<span class="author">{{ entry.author }}</span>
{%- set body = entry.body %}
{%- if body.kind == "text" %}
<p class="text">{{ body.text }}</p>
{%- elif body.kind == "voice" %}
<p class="voice">Voice Message</p>
{%- elif body.kind == "image" %}
<img class="media" src="{{ body.src }}" alt="image">
{%- elif body.kind == "video" %}
<video class="media" src="{{ body.src }}" controls></video>
{%- elif body.kind == "attachment" %}
<p class="attachment">[attachment] <a href="{{ body.path }}">{{ body.path }}</a></p>
{%- elif body.kind == "deleted" %}
<p class="deleted">Message deleted</p>
{%- endif %}
{%- if body.caption %}
<p class="caption">{{ body.caption }}</p>
{%- endif %}
<time>{{ entry.timestamp }}</time>
</div>
{%- endfor %}
</main>
</body>
</html>
"#;

const STYLESHEET: &str = r#"body { font-family: sans-serif; background: #e5ddd5; margin: 0; }
.chat-header { background: #075e54; color: #fff; padding: 0.5em 1em; }
.chat-header h1 { font-size: 1.2em; margin: 0; }
.chat { display: flex; flex-direction: column; padding: 1em; gap: 0.4em; }
.message { max-width: 70%; padding: 0.4em 0.7em; border-radius: 6px; }
.message.self { align-self: flex-end; background: #dcf8c6; }
.message.partner { align-self: flex-start; background: #fff; }
.message.system { align-self: center; background: #fff3c4; font-style: italic; }
.message .author { font-weight: bold; font-size: 0.8em; }
.message p { margin: 0.2em 0; white-space: pre-wrap; }
.message time { display: block; text-align: right; font-size: 0.7em; color: #777; }
.message .media { max-width: 100%; }
"#;

const SCRIPT: &str = r#"document.addEventListener("DOMContentLoaded", () => {
  for (const el of document.querySelectorAll(".message[data-timestamp]")) {
    el.title = el.dataset.timestamp;
  }
});
"#;

fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE)?;
    Ok(env)
}

pub fn render_html(doc: &Document) -> Result<String, minijinja::Error> {
    let env = environment()?;
    let template = env.get_template(TEMPLATE_NAME)?;
    template.render(context! {
        title => &doc.title,
        entries => &doc.entries,
        stylesheet => STYLESHEET_NAME,
        script => SCRIPT_NAME,
    })
}

pub fn write_html<W: Write>(writer: &mut W, doc: &Document) -> std::io::Result<()> {
    let html = render_html(doc)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    writer.write_all(html.as_bytes())
}

/// Write the default stylesheet and script into `dir`, leaving existing files alone
pub fn write_assets(dir: &Path) -> std::io::Result<()> {
    for (name, content) in [(STYLESHEET_NAME, STYLESHEET), (SCRIPT_NAME, SCRIPT)] {
        let path = dir.join(name);
        if !path.exists() {
            std::fs::write(&path, content)?;
        }
    }
    Ok(())
}
