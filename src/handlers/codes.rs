use actix_web::web::{Json, Query};
use serde::{Deserialize, Serialize};

use crate::core::label_codes::{barcode_png, qr_png};
use crate::error::Error;

#[derive(Debug, Default, Deserialize)]
pub struct CodeQuery {
    #[serde(default)]
    pub data: String,
}

impl CodeQuery {
    fn data(&self) -> Result<&str, Error> {
        if self.data.is_empty() {
            return Err(Error::form("data", crate::forms::REQUIRED));
        }
        Ok(&self.data)
    }
}

#[derive(Debug, Serialize)]
pub struct DataUri {
    pub data_uri: String,
}

pub async fn barcode(query: Query<CodeQuery>) -> Result<Json<DataUri>, Error> {
    let data_uri = barcode_png(query.data()?)?;
    Ok(Json(DataUri { data_uri }))
}

pub async fn qr(query: Query<CodeQuery>) -> Result<Json<DataUri>, Error> {
    let data_uri = qr_png(query.data()?)?;
    Ok(Json(DataUri { data_uri }))
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::{call_and_read_body_json, call_service, init_service, TestRequest};
    use actix_web::web::get;
    use actix_web::App;
    use serde_json::Value;

    #[actix_web::test]
    async fn test_codes_return_png_data_uris() {
        let app = init_service(App::new().route("/codes/barcode/", get().to(barcode)).route("/codes/qr/", get().to(qr))).await;
        for uri in ["/codes/barcode/?data=SKU-0042", "/codes/qr/?data=https%3A%2F%2Facme.com%2Fp%2F42"] {
            let body: Value = call_and_read_body_json(&app, TestRequest::get().uri(uri).to_request()).await;
            assert!(body["data_uri"].as_str().unwrap().starts_with("data:image/png;base64,"));
        }
    }

    #[actix_web::test]
    async fn test_missing_data_is_bad_request() {
        let app = init_service(App::new().route("/codes/qr/", get().to(qr))).await;
        let resp = call_service(&app, TestRequest::get().uri("/codes/qr/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
