use actix_web::cookie::Cookie;
use actix_web::http::header::LOCATION;
use actix_web::HttpResponse;

use crate::flash::{self, Message, Messages};
use crate::forms::FormErrors;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct List<T> {
    list: Vec<T>,
    total: i64,
}

impl<T> List<T> {
    pub fn new(list: Vec<T>, total: i64) -> Self {
        List { list, total }
    }
}

/// JSON page payload: queued flash messages, optional form errors, and the
/// page data flattened alongside.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FormErrors>,
    #[serde(flatten)]
    data: T,
}

pub fn page<T: Serialize>(messages: Messages, data: T) -> HttpResponse {
    render(messages, None, data)
}

pub fn form_page<T: Serialize>(messages: Messages, errors: FormErrors, data: T) -> HttpResponse {
    render(messages, Some(errors), data)
}

fn render<T: Serialize>(Messages(messages): Messages, errors: Option<FormErrors>, data: T) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    if !messages.is_empty() {
        builder.cookie(flash::clear_cookie());
    }
    builder.json(Page { messages, errors, data })
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther().insert_header((LOCATION, location)).finish()
}

pub fn redirect_with(location: &str, messages: &[Message]) -> HttpResponse {
    HttpResponse::SeeOther().insert_header((LOCATION, location)).cookie(flash::cookie(messages)).finish()
}

pub fn redirect_setting<I>(location: &str, cookies: I) -> HttpResponse
where
    I: IntoIterator<Item = Cookie<'static>>,
{
    let mut builder = HttpResponse::SeeOther();
    builder.insert_header((LOCATION, location));
    for c in cookies {
        builder.cookie(c);
    }
    builder.finish()
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_page_flattens_data_and_clears_flash() {
        let resp = page(Messages(vec![Message::info("hi")]), json!({ "org": "Acme Inc" }));
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.cookies().any(|c| c.name() == flash::FLASH_COOKIE));
        let body: Value = serde_json::from_slice(&to_bytes(resp.into_body()).await.unwrap()).unwrap();
        assert_eq!(body["org"], "Acme Inc");
        assert_eq!(body["messages"][0]["text"], "hi");
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_redirect_is_see_other() {
        let resp = redirect("/login/");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/login/");
    }
}
