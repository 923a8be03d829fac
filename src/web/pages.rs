//! Server-rendered HTML pages.
//!
//! Every dynamic value goes through [`escape`] before it is written.

use std::fmt::Write;

use crate::application::Prediction;
use crate::domain::User;

use super::session::Flash;

/// Escape text for HTML element content and quoted attributes.
#[must_use]
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Data every page needs for its header.
pub struct PageContext<'a> {
    pub user: Option<&'a User>,
    pub flashes: &'a [Flash],
}

fn nav(ctx: &PageContext<'_>) -> String {
    let mut html = String::from(
        r#"<nav><a href="/">Home</a> <a href="/about">About</a> <a href="/contact">Contact</a> <a href="/developer">Developer</a> <a href="/blog">Blog</a>"#,
    );
    match ctx.user {
        Some(user) => {
            let _ = write!(
                html,
                r#" <span class="user">{}</span> <a href="/logout">Logout</a>"#,
                escape(&user.username)
            );
        }
        None => html.push_str(r#" <a href="/login">Login</a> <a href="/signup">Sign up</a>"#),
    }
    html.push_str("</nav>");
    html
}

fn alerts(ctx: &PageContext<'_>) -> String {
    ctx.flashes
        .iter()
        .map(|f| {
            format!(
                r#"<div class="alert alert-{}">{}</div>"#,
                f.category(),
                escape(&f.message(ctx.user))
            )
        })
        .collect()
}

fn layout(title: &str, ctx: &PageContext<'_>, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Health Care Center</title>
</head>
<body>
{nav}
<main>
{alerts}
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
        nav = nav(ctx),
        alerts = alerts(ctx),
    )
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        return "<p>No information available.</p>".to_string();
    }
    let mut html = String::from("<ul>");
    for item in items {
        let _ = write!(html, "<li>{}</li>", escape(item));
    }
    html.push_str("</ul>");
    html
}

/// What the symptom form page shows below the form.
pub enum IndexView<'a> {
    Empty,
    Message(&'a str),
    Result(&'a Prediction),
}

/// Symptom form, optionally with a message or a prediction.
#[must_use]
pub fn index(ctx: &PageContext<'_>, symptoms_input: &str, view: IndexView<'_>) -> String {
    let mut body = format!(
        r#"<h1>Health Care Center</h1>
<form action="/predict" method="post">
<label for="symptoms">Type symptoms (comma separated, e.g. itching, skin_rash):</label>
<input type="text" id="symptoms" name="symptoms" value="{}" placeholder="itching, skin_rash, nodal_skin_eruptions">
<button type="submit">Predict</button>
</form>
"#,
        escape(symptoms_input)
    );

    match view {
        IndexView::Empty => {}
        IndexView::Message(message) => {
            let _ = write!(
                body,
                r#"<div class="alert alert-warning">{}</div>"#,
                escape(message)
            );
        }
        IndexView::Result(prediction) => {
            let result = &prediction.result;
            if !prediction.ignored.is_empty() {
                let _ = write!(
                    body,
                    r#"<p class="ignored">Ignored unrecognised symptoms: {}</p>"#,
                    escape(&prediction.ignored.join(", "))
                );
            }
            let _ = write!(
                body,
                r#"<section id="result">
<h2>Predicted disease: <span class="disease">{disease}</span></h2>
<h3>Description</h3><p>{description}</p>
<h3>Precautions</h3>{precautions}
<h3>Medications</h3>{medications}
<h3>Workouts</h3>{workouts}
<h3>Diets</h3>{diets}
</section>
"#,
                disease = escape(&result.disease),
                description = escape(&result.description),
                precautions = list(&result.precautions),
                medications = list(&result.medications),
                workouts = list(&result.workouts),
                diets = list(&result.diets),
            );
        }
    }

    layout("Home", ctx, &body)
}

fn form_errors(errors: &[String]) -> String {
    errors
        .iter()
        .map(|e| format!(r#"<div class="alert alert-danger">{}</div>"#, escape(e)))
        .collect()
}

/// Signup form with any validation errors and the previously entered values.
#[must_use]
pub fn signup(ctx: &PageContext<'_>, errors: &[String], username: &str, email: &str) -> String {
    let body = format!(
        r#"<h1>Sign up</h1>
{errors}
<form action="/signup" method="post">
<label for="username">Username</label>
<input type="text" id="username" name="username" value="{username}" maxlength="20" required>
<label for="email">Email</label>
<input type="email" id="email" name="email" value="{email}" maxlength="120" required>
<label for="password">Password</label>
<input type="password" id="password" name="password" required>
<button type="submit">Sign up</button>
</form>
<p>Already have an account? <a href="/login">Log in</a></p>
"#,
        errors = form_errors(errors),
        username = escape(username),
        email = escape(email),
    );
    layout("Sign up", ctx, &body)
}

/// Login form. `next` is carried through the form action.
#[must_use]
pub fn login(ctx: &PageContext<'_>, errors: &[String], email: &str, next: Option<&str>) -> String {
    let action = match next {
        Some(next) => format!("/login?next={}", urlencoding::encode(next)),
        None => "/login".to_string(),
    };
    let body = format!(
        r#"<h1>Log in</h1>
{errors}
<form action="{action}" method="post">
<label for="email">Email</label>
<input type="email" id="email" name="email" value="{email}" required>
<label for="password">Password</label>
<input type="password" id="password" name="password" required>
<button type="submit">Log in</button>
</form>
<p>New here? <a href="/signup">Create an account</a></p>
"#,
        errors = form_errors(errors),
        action = escape(&action),
        email = escape(email),
    );
    layout("Log in", ctx, &body)
}

/// The informational pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticPage {
    About,
    Contact,
    Developer,
    Blog,
}

impl StaticPage {
    fn title(self) -> &'static str {
        match self {
            StaticPage::About => "About",
            StaticPage::Contact => "Contact",
            StaticPage::Developer => "Developer",
            StaticPage::Blog => "Blog",
        }
    }

    fn body(self) -> &'static str {
        match self {
            StaticPage::About => {
                "<h1>About</h1>\n<p>Health Care Center suggests a likely disease from the symptoms you enter, together with a description, precautions, medications, diets and workouts for it. It is not a substitute for professional medical advice.</p>"
            }
            StaticPage::Contact => {
                "<h1>Contact</h1>\n<p>For questions or feedback, reach the maintainers through the project's issue tracker.</p>"
            }
            StaticPage::Developer => {
                "<h1>Developer</h1>\n<p>Built as a small demonstration of symptom-based disease lookup with a pre-trained classifier.</p>"
            }
            StaticPage::Blog => {
                "<h1>Blog</h1>\n<p>Articles on staying healthy will appear here.</p>"
            }
        }
    }
}

#[must_use]
pub fn static_page(ctx: &PageContext<'_>, page: StaticPage) -> String {
    layout(page.title(), ctx, page.body())
}
