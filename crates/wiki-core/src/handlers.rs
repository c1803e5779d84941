//! Request routing and the `view` / `edit` / `save` handlers.
//!
//! Each raw handler takes an already validated title. [`with_valid_title`]
//! wraps it so that the path is checked first and anything that does not
//! match gets a 404 without touching the store.

use crate::error::WikiError;
use crate::http::{Request, Response};
use crate::page::{Page, PageStore};
use crate::template::Templates;
use crate::title::{Action, TitleValidator};

/// A handler that has been given a validated title.
pub type TitleHandler = fn(&Wiki, &Request, &str) -> Response;

/// A handler routed by path prefix; validates on its own.
pub type RouteHandler = Box<dyn Fn(&Wiki, &Request) -> Response + Send + Sync>;

/// Wraps `handler` so that it only runs when the request path is a valid
/// `/<action>/<title>` path; otherwise responds 404.
pub fn with_valid_title(action: Action, handler: TitleHandler) -> RouteHandler {
    Box::new(move |wiki: &Wiki, req: &Request| {
        match wiki.validator.title_for(action, &req.path) {
            Ok(title) => handler(wiki, req, &title),
            Err(e) => {
                tracing::debug!(path = %req.path, "{}", e);
                Response::not_found()
            }
        }
    })
}

/// Everything a request needs, built once at startup and shared read-only.
pub struct Wiki {
    validator: TitleValidator,
    store: PageStore,
    templates: Templates,
    routes: Vec<(&'static str, RouteHandler)>,
}

impl Wiki {
    pub fn new(store: PageStore, templates: Templates) -> Self {
        let routes = vec![
            (
                Action::View.prefix(),
                with_valid_title(Action::View, view_handler),
            ),
            (
                Action::Edit.prefix(),
                with_valid_title(Action::Edit, edit_handler),
            ),
            (
                Action::Save.prefix(),
                with_valid_title(Action::Save, save_handler),
            ),
        ];
        Self {
            validator: TitleValidator::new(),
            store,
            templates,
            routes,
        }
    }

    pub fn store(&self) -> &PageStore {
        &self.store
    }

    /// Dispatches by path prefix; unknown prefixes are 404.
    pub fn handle(&self, req: &Request) -> Response {
        let resp = match self
            .routes
            .iter()
            .find(|(prefix, _)| req.path.starts_with(prefix))
        {
            Some((_, route)) => route(self, req),
            None => Response::not_found(),
        };
        tracing::debug!(
            method = %req.method,
            path = %req.path,
            status = resp.status.code(),
            "handled request"
        );
        resp
    }

    fn render(&self, name: &str, page: &Page) -> Response {
        match self.templates.render(name, page) {
            Ok(html) => Response::html(html),
            Err(e) => {
                let err = WikiError::from(e);
                tracing::warn!(template = name, title = %page.title, "render failed: {}", err);
                Response::internal_error(err.to_string())
            }
        }
    }
}

/// Shows the page, or sends the client to the edit form if it cannot be loaded.
pub fn view_handler(wiki: &Wiki, _req: &Request, title: &str) -> Response {
    match wiki.store.load(title) {
        Ok(page) => wiki.render(Action::View.as_str(), &page),
        Err(e) => {
            if !e.is_not_found() {
                tracing::warn!(title, "load failed: {}", e);
            }
            Response::redirect(&format!("{}{}", Action::Edit.prefix(), title))
        }
    }
}

/// Edit form, prefilled from the stored page or empty if there is none.
pub fn edit_handler(wiki: &Wiki, _req: &Request, title: &str) -> Response {
    let page = match wiki.store.load(title) {
        Ok(page) => page,
        Err(e) => {
            if !e.is_not_found() {
                tracing::warn!(title, "load failed: {}", e);
            }
            Page::empty(title)
        }
    };
    wiki.render(Action::Edit.as_str(), &page)
}

/// Stores form field `body` under `title` and redirects to the view page.
pub fn save_handler(wiki: &Wiki, req: &Request, title: &str) -> Response {
    let body = req.form_value("body").unwrap_or_default();
    let page = Page::new(title, body);
    match wiki.store.save(&page) {
        Ok(()) => Response::redirect(&format!("{}{}", Action::View.prefix(), title)),
        Err(e) => {
            tracing::warn!(title, "save failed: {}", e);
            Response::internal_error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Status;
    use std::fs;

    const VIEW: &str = "<h1>{{ Title }}</h1><div>{{ Body }}</div>";
    const EDIT: &str = "<h1>Editing {{ Title }}</h1><textarea>{{ Body }}</textarea>";

    fn wiki_in(dir: &std::path::Path) -> Wiki {
        let templates = Templates::from_sources([("view", VIEW), ("edit", EDIT)]).unwrap();
        Wiki::new(PageStore::new(dir), templates)
    }

    fn body_str(resp: &Response) -> String {
        String::from_utf8(resp.body.clone()).unwrap()
    }

    #[test]
    fn view_missing_page_redirects_to_edit() {
        let dir = tempfile::tempdir().unwrap();
        let wiki = wiki_in(dir.path());
        let resp = wiki.handle(&Request::new("GET", "/view/NewPage"));
        assert_eq!(resp.status, Status::Found);
        assert_eq!(resp.header("location"), Some("/edit/NewPage"));
    }

    #[test]
    fn edit_missing_page_renders_empty_form() {
        let dir = tempfile::tempdir().unwrap();
        let wiki = wiki_in(dir.path());
        let resp = wiki.handle(&Request::new("GET", "/edit/NewPage"));
        assert_eq!(resp.status, Status::Ok);
        assert_eq!(
            body_str(&resp),
            "<h1>Editing NewPage</h1><textarea></textarea>"
        );
    }

    #[test]
    fn save_then_view_escapes_markup() {
        let dir = tempfile::tempdir().unwrap();
        let wiki = wiki_in(dir.path());
        let resp = wiki.handle(&Request::form_post(
            "/save/Xss",
            &[("body", "<script>alert(1)</script>")],
        ));
        assert_eq!(resp.status, Status::Found);
        assert_eq!(resp.header("location"), Some("/view/Xss"));
        assert_eq!(
            fs::read(dir.path().join("Xss.txt")).unwrap(),
            b"<script>alert(1)</script>"
        );

        let resp = wiki.handle(&Request::new("GET", "/view/Xss"));
        assert_eq!(resp.status, Status::Ok);
        let html = body_str(&resp);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;"));
    }

    #[test]
    fn percent_encoded_title_is_decoded_before_validation() {
        let dir = tempfile::tempdir().unwrap();
        let wiki = wiki_in(dir.path());
        let resp = wiki.handle(&Request::new("GET", "/edit/%54est"));
        assert_eq!(resp.status, Status::Ok);
        assert_eq!(body_str(&resp), "<h1>Editing Test</h1><textarea></textarea>");

        for target in ["/view/..%2Fx", "/view/a%2Eb", "/save/%2E%2E", "/view/a%00"] {
            let resp = wiki.handle(&Request::form_post(target, &[("body", "x")]));
            assert_eq!(resp.status, Status::NotFound, "{target}");
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn render_failure_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let templates = Templates::from_sources([
            ("view", "{% if Body %}{{ Body.missing.deeper }}{% endif %}"),
            ("edit", EDIT),
        ])
        .unwrap();
        let wiki = Wiki::new(PageStore::new(dir.path()), templates);
        wiki.store().save(&Page::new("Home", "x")).unwrap();
        let resp = wiki.handle(&Request::new("GET", "/view/Home"));
        assert_eq!(resp.status, Status::InternalServerError);
        assert!(body_str(&resp).contains("render failed"));
    }

    #[test]
    fn edit_prefills_existing_page() {
        let dir = tempfile::tempdir().unwrap();
        let wiki = wiki_in(dir.path());
        wiki.store().save(&Page::new("Home", "welcome")).unwrap();
        let resp = wiki.handle(&Request::new("GET", "/edit/Home"));
        assert_eq!(body_str(&resp), "<h1>Editing Home</h1><textarea>welcome</textarea>");
    }

    #[test]
    fn save_without_body_field_stores_empty_page() {
        let dir = tempfile::tempdir().unwrap();
        let wiki = wiki_in(dir.path());
        let resp = wiki.handle(&Request::form_post("/save/Blank", &[]));
        assert_eq!(resp.status, Status::Found);
        assert!(wiki.store().load("Blank").unwrap().body.is_empty());
    }

    #[test]
    fn last_save_wins() {
        let dir = tempfile::tempdir().unwrap();
        let wiki = wiki_in(dir.path());
        wiki.handle(&Request::form_post("/save/P", &[("body", "first")]));
        wiki.handle(&Request::form_post("/save/P", &[("body", "second")]));
        assert_eq!(wiki.store().load("P").unwrap().body, b"second");
    }

    #[test]
    fn invalid_paths_are_404_without_io() {
        let dir = tempfile::tempdir().unwrap();
        let wiki = wiki_in(dir.path());
        for target in [
            "/",
            "/view/",
            "/view/../secret",
            "/save/a.b",
            "/edit/a/b",
            "/other/Page",
            "/viewx/Page",
        ] {
            let resp = wiki.handle(&Request::form_post(target, &[("body", "x")]));
            assert_eq!(resp.status, Status::NotFound, "{target}");
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn save_failure_is_500_with_error_text() {
        let dir = tempfile::tempdir().unwrap();
        let wiki = wiki_in(&dir.path().join("missing-dir"));
        let resp = wiki.handle(&Request::form_post("/save/P", &[("body", "x")]));
        assert_eq!(resp.status, Status::InternalServerError);
        assert!(body_str(&resp).contains("\"P\""));
    }

    #[test]
    fn view_unreadable_page_degrades_to_redirect() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Broken.txt")).unwrap();
        let wiki = wiki_in(dir.path());
        let resp = wiki.handle(&Request::new("GET", "/view/Broken"));
        assert_eq!(resp.status, Status::Found);
        assert_eq!(resp.header("location"), Some("/edit/Broken"));
    }

    #[test]
    fn missing_template_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let templates = Templates::from_sources([("edit", EDIT)]).unwrap();
        let wiki = Wiki::new(PageStore::new(dir.path()), templates);
        wiki.store().save(&Page::new("Home", "x")).unwrap();
        let resp = wiki.handle(&Request::new("GET", "/view/Home"));
        assert_eq!(resp.status, Status::InternalServerError);
        assert!(body_str(&resp).contains("view"));
    }

    #[test]
    fn query_string_does_not_affect_routing() {
        let dir = tempfile::tempdir().unwrap();
        let wiki = wiki_in(dir.path());
        let resp = wiki.handle(&Request::new("GET", "/edit/Home?x=1"));
        assert_eq!(resp.status, Status::Ok);
    }
}
