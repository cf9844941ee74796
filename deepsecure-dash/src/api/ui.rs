//! UI routes - dashboard page
//!
//! Server-rendered record cards plus a small script that reloads a card
//! fragment whenever its record changes on /events. Each card's remove
//! button issues DELETE /files/:id.

use axum::{extract::State, response::Html, routing::get, Router};

use crate::services::{present, presenter::escape_html};
use crate::AppState;

pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(dashboard_page))
}

/// GET / - dashboard
async fn dashboard_page(State(state): State<AppState>) -> Html<String> {
    let records = state.records.list().await;

    let mut cards = String::new();
    for record in &records {
        cards.push_str(&present(record).to_html());
    }
    if records.is_empty() {
        cards.push_str("<p class=\"empty\">No files uploaded yet.</p>");
    }

    let mut samples = String::new();
    for entry in state.samples.entries() {
        let button = if entry.available() {
            format!(
                "<button data-sample=\"{}\">{}</button>",
                escape_html(entry.name),
                escape_html(entry.label)
            )
        } else {
            format!(
                "<button disabled>{} (coming soon)</button>",
                escape_html(entry.label)
            )
        };
        samples.push_str(&button);
    }

    Html(DASHBOARD_TEMPLATE
        .replace("{{cards}}", &cards)
        .replace("{{samples}}", &samples))
}

const DASHBOARD_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>DeepSecure - Deepfake Detection</title>
    <style>
        body { font-family: system-ui, -apple-system, sans-serif; max-width: 960px; margin: 40px auto; padding: 20px; line-height: 1.5; }
        h1 { color: #222; border-bottom: 2px solid #6d28d9; padding-bottom: 10px; }
        .result-card { border: 1px solid #ddd; border-radius: 6px; padding: 12px; margin: 12px 0; }
        .file-header { display: flex; gap: 10px; align-items: center; }
        .file-tag { width: 10px; height: 10px; border-radius: 50%; display: inline-block; }
        .bg-blue-500 { background: #3b82f6; } .bg-accent { background: #6d28d9; } .bg-green-500 { background: #22c55e; }
        .bg-orange-500 { background: #f97316; } .bg-pink-500 { background: #ec4899; } .bg-slate-500 { background: #64748b; }
        .badge { margin-left: auto; padding: 2px 8px; border-radius: 4px; font-size: 0.9em; }
        .badge-pending { background: #e0e7ff; } .badge-authentic { background: #dcfce7; }
        .badge-fake { background: #fee2e2; } .badge-warning { background: #fef3c7; }
        .preview { max-width: 240px; max-height: 160px; margin-top: 8px; }
        .remove { border: none; background: none; cursor: pointer; font-size: 1.1em; }
        .flagged { color: #b91c1c; } .error { color: #b45309; }
    </style>
</head>
<body>
    <h1>DeepSecure</h1>
    <form id="upload" enctype="multipart/form-data">
        <select name="category">
            <option value="image">Image</option>
            <option value="video">Video</option>
            <option value="audio">Audio</option>
        </select>
        <input type="file" name="file" multiple>
        <button type="submit">Analyze</button>
    </form>
    <div id="samples">{{samples}}</div>
    <div id="records">{{cards}}</div>
    <script>
        const records = document.getElementById('records');
        document.getElementById('upload').addEventListener('submit', async (e) => {
            e.preventDefault();
            const form = new FormData();
            for (const file of e.target.file.files) form.append('file', file);
            await fetch('/files?category=' + e.target.category.value, { method: 'POST', body: form });
        });
        document.querySelectorAll('[data-sample]').forEach((button) => {
            button.addEventListener('click', () => fetch('/samples/' + button.dataset.sample, { method: 'POST' }));
        });
        records.addEventListener('click', async (e) => {
            const button = e.target.closest('[data-remove]');
            if (!button) return;
            await fetch('/files/' + button.dataset.remove, { method: 'DELETE' });
        });
        async function refreshCard(id) {
            const res = await fetch('/files/' + id + '/view.html');
            const existing = records.querySelector('[data-record-id="' + id + '"]');
            if (!res.ok) { if (existing) existing.remove(); return; }
            const html = await res.text();
            if (existing) { existing.outerHTML = html; } else { records.querySelector('.empty')?.remove(); records.insertAdjacentHTML('afterbegin', html); }
        }
        const events = new EventSource('/events');
        ['RecordAdded', 'RecordStageChanged', 'RecordResolved', 'RecordRemoved'].forEach((type) => {
            events.addEventListener(type, (e) => refreshCard(JSON.parse(e.data).record_id));
        });
        events.addEventListener('RecordsCleared', () => { records.innerHTML = ''; });
    </script>
</body>
</html>
"#;
