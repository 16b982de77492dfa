use crate::models::{Event, User};
use axum::http::StatusCode;

/// Server-rendered pages for the admin surface. The markup is deliberately plain;
/// every page is a full document assembled from the shared layout, and all dynamic
/// values pass through `escape` on the way in.

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; color: #212529; }
nav { background: #343a40; padding: 0.75rem 1.5rem; }
nav a { color: #f8f9fa; margin-right: 1.25rem; text-decoration: none; }
nav a:hover { text-decoration: underline; }
main { padding: 1.5rem; max-width: 60rem; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid #dee2e6; padding: 0.5rem; text-align: left; }
th { background: #e9ecef; }
form.inline { margin: 1rem 0; }
form.inline input, form.inline select { margin-right: 0.5rem; padding: 0.25rem; }
.error { color: #842029; background: #f8d7da; padding: 1rem; border-radius: 0.25rem; }
"#;

const USERS_SCRIPT: &str = r#"
async function createUser(form) {
    const body = {
        uid: form.uid.value,
        username: form.username.value,
        role: form.role.value,
    };
    const res = await fetch('/api/user', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(body),
    });
    if (res.ok) {
        location.reload();
    } else {
        const detail = await res.json().catch(() => ({}));
        alert(detail.error || 'request failed');
    }
    return false;
}
async function deleteUser(uid) {
    await fetch('/api/user/' + encodeURIComponent(uid), { method: 'DELETE' });
    location.reload();
}
"#;

const EVENTS_SCRIPT: &str = r#"
async function createEvent(form) {
    const body = {
        createdBy: form.created_by.value,
        title: form.title.value,
        location: form.location.value,
    };
    const res = await fetch('/api/event', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(body),
    });
    if (res.ok) {
        location.reload();
    } else {
        const detail = await res.json().catch(() => ({}));
        alert(detail.error || 'request failed');
    }
    return false;
}
async function deleteEvent(id) {
    await fetch('/api/event/' + id, { method: 'DELETE' });
    location.reload();
}
"#;

const SIGN_IN_SCRIPT: &str = r#"
function signIn(form) {
    const token = form.token.value.trim();
    if (token) {
        document.cookie = '__session=' + token + '; path=/';
        location.href = '/admin';
    }
    return false;
}
"#;

/// Replaces the HTML metacharacters in untrusted text. Ampersand first so already
/// escaped entities are not produced.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn top_bar() -> &'static str {
    r#"<nav>
  <a href="/">Home</a>
  <a href="/admin">Admin</a>
  <a href="/admin/user">Users</a>
  <a href="/admin/event">Events</a>
  <a href="/sign-in">Sign in</a>
</nav>"#
}

/// Wraps page content in the shared document shell.
fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Event Portal</title>
<style>{STYLE}</style>
</head>
<body>
{nav}
<main>
{content}
</main>
</body>
</html>"#,
        title = escape(title),
        nav = top_bar(),
    )
}

pub fn home_page() -> String {
    layout(
        "Home",
        r#"<h1>Event Portal</h1>
<p>A small portal for managing users and the events they organize.</p>
<p>The REST API lives under <code>/api</code>; the admin pages under <code>/admin</code> require a session.</p>"#,
    )
}

pub fn sign_in_page() -> String {
    let content = format!(
        r#"<h1>Sign in</h1>
<p>Paste a session token issued by the identity provider. It is stored as the
<code>__session</code> cookie and checked on every admin request.</p>
<form class="inline" onsubmit="return signIn(this)">
  <input name="token" placeholder="session token" size="48" required>
  <button type="submit">Sign in</button>
</form>
<script>{SIGN_IN_SCRIPT}</script>"#
    );
    layout("Sign in", &content)
}

pub fn dashboard_page(subject: &str, user_count: usize, event_count: usize) -> String {
    let content = format!(
        r#"<h1>Admin</h1>
<p>Signed in as <strong>{subject}</strong>.</p>
<ul>
  <li><a href="/admin/user">Users</a>: {user_count}</li>
  <li><a href="/admin/event">Events</a>: {event_count}</li>
</ul>"#,
        subject = escape(subject),
    );
    layout("Admin", &content)
}

pub fn users_page(users: &[User]) -> String {
    let mut rows = String::new();
    for user in users {
        rows.push_str(&format!(
            r#"<tr>
  <td>{uid}</td>
  <td>{username}</td>
  <td>{role}</td>
  <td><button onclick="deleteUser('{uid}')">Delete</button></td>
</tr>
"#,
            uid = escape(&user.uid),
            username = escape(&user.username),
            role = escape(&user.role),
        ));
    }

    let content = format!(
        r#"<h1>Users</h1>
<form class="inline" onsubmit="return createUser(this)">
  <input name="uid" placeholder="uid" required>
  <input name="username" placeholder="username" required>
  <select name="role">
    <option value="user">user</option>
    <option value="admin">admin</option>
  </select>
  <button type="submit">Create</button>
</form>
<table>
<tr><th>Uid</th><th>Username</th><th>Role</th><th></th></tr>
{rows}</table>
<script>{USERS_SCRIPT}</script>"#
    );
    layout("Users", &content)
}

pub fn events_page(events: &[Event]) -> String {
    let mut rows = String::new();
    for event in events {
        let start = event
            .start_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        rows.push_str(&format!(
            r#"<tr>
  <td>{id}</td>
  <td>{title}</td>
  <td>{created_by}</td>
  <td>{status}</td>
  <td>{start}</td>
  <td>{public}</td>
  <td><button onclick="deleteEvent({id})">Delete</button></td>
</tr>
"#,
            id = event.id,
            title = escape(&event.title),
            created_by = escape(&event.created_by),
            status = escape(&event.status),
            start = escape(&start),
            public = event.is_public,
        ));
    }

    let content = format!(
        r#"<h1>Events</h1>
<form class="inline" onsubmit="return createEvent(this)">
  <input name="created_by" placeholder="creator uid" required>
  <input name="title" placeholder="title" required>
  <input name="location" placeholder="location">
  <button type="submit">Create</button>
</form>
<table>
<tr><th>Id</th><th>Title</th><th>Created by</th><th>Status</th><th>Start</th><th>Public</th><th></th></tr>
{rows}</table>
<script>{EVENTS_SCRIPT}</script>"#
    );
    layout("Events", &content)
}

/// Full-page error rendering for the HTML surface, used by the session middleware
/// and the admin page handlers.
pub fn error_page(status: StatusCode, detail: &str) -> String {
    let content = format!(
        r#"<h1>{code}</h1>
<p class="error">{detail}</p>
<p><a href="/sign-in">Sign in</a> or go back <a href="/">home</a>.</p>"#,
        code = status,
        detail = escape(detail),
    );
    layout("Error", &content)
}
