use actix_web::{web, Responder};
use handlebars::Handlebars;
use serde_json::json;

use crate::services::render_service::render_page;

/*
    GET /
*/
pub async fn index(hbs: web::Data<Handlebars<'static>>) -> impl Responder {
    render_page(hbs.get_ref(), "index", &json!({}))
}
