//! # Sales Handlers

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use tally_core::{CatalogItem, SaleDetail, SaleForm, SaleId, SaleType};
use tracing::debug;

use crate::error::ApiResult;
use crate::routes::SALES_PATH;
use crate::session::Identity;
use crate::state::{AppState, SalesPage};

/// Query string of the sales listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub query: Option<String>,
    pub page: Option<u32>,
}

/// Data the create-sale form is rendered from.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFormData {
    pub items: Vec<CatalogItem>,
    pub types: Vec<SaleType>,
}

/// `GET /dashboard/sales?query=&page=`
pub async fn list_sales(
    State(state): State<AppState>,
    _identity: Identity,
    Query(params): Query<ListingParams>,
) -> ApiResult<Json<SalesPage>> {
    let query = params.query.unwrap_or_default().trim().to_string();
    let page = params.page.unwrap_or(1).max(1);

    if let Some(cached) = state.listing_cache.get(&query, page).await {
        debug!(%query, page, "Sales listing served from cache");
        return Ok(Json(cached));
    }

    let generation = state.listing_cache.generation().await;
    let page_size = state.config.listing_page_size;
    let sales = state.db.sales();
    let listing = SalesPage {
        sales: sales.list_filtered(&query, page, page_size).await?,
        total_pages: sales.count_pages(&query, page_size).await?,
        query,
        page,
    };

    state.listing_cache.insert(generation, listing.clone()).await;
    Ok(Json(listing))
}

/// `GET /dashboard/sales/{id}`
pub async fn show_sale(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<SaleId>,
) -> ApiResult<Json<SaleDetail>> {
    let detail = state.db.sales().get_detail(id).await?;
    Ok(Json(detail))
}

/// `GET /dashboard/sales/create`
pub async fn create_form(
    State(state): State<AppState>,
    _identity: Identity,
) -> ApiResult<Json<CreateFormData>> {
    let items = state.db.items().list_for_sale().await?;
    Ok(Json(CreateFormData {
        items,
        types: SaleType::ALL.to_vec(),
    }))
}

/// `POST /dashboard/sales/create`
///
/// The identity is resolved here but judged by the recorder, so a
/// missing session is reported before the body is decoded or validated.
pub async fn create_sale(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<SaleForm>, FormRejection>,
) -> Result<Redirect, Response> {
    let identity = state.sessions.identify(&headers);

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) if identity.is_some() => return Err(rejection.into_response()),
        // Anonymous callers get the authentication error, whatever they sent.
        Err(_) => SaleForm::default(),
    };

    state
        .recorder()
        .record(identity.as_ref(), &form)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Redirect::to(SALES_PATH))
}
