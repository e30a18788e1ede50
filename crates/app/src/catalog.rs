use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use storefront_core::catalog::ListedProduct;

use crate::request::RequestScope;
use crate::router::AppState;
use crate::tap::{StageEvent, StageKind};

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogPage {
    products: Vec<ListedProduct>,
    categories: Vec<&'static str>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Json<CatalogPage> {
    let scope = RequestScope::begin("products");
    let catalog = state.catalog();
    let page = CatalogPage {
        products: catalog.listing(query.category.as_deref(), state.inventory()),
        categories: catalog.categories(),
    };

    state.tap().publish(StageEvent::completed(
        state.now(),
        StageKind::Catalog,
        &scope,
        StatusCode::OK.as_u16(),
        json!({ "category": query.category }),
        &page,
    ));
    scope.finish(StatusCode::OK);
    Json(page)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::router::test_support::*;

    #[tokio::test]
    async fn lists_every_product_by_default() {
        let response = get_uri(setup_state(), "/api/products").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["products"].as_array().map(Vec::len), Some(6));
        assert_eq!(body["categories"][0], "All");
    }

    #[tokio::test]
    async fn filters_by_category() {
        let body = body_json(get_uri(setup_state(), "/api/products?category=Electronics").await).await;
        let names: Vec<_> = body["products"]
            .as_array()
            .expect("products")
            .iter()
            .filter_map(|product| product["name"].as_str())
            .collect();
        assert_eq!(names, ["Premium Wireless Headphones", "Bluetooth Speaker"]);
    }

    #[tokio::test]
    async fn listed_stock_follows_inventory_adjustments() {
        let state = setup_state();
        let response = post_json(
            state.clone(),
            "/api/inventory",
            json!({"product_id": 2, "quantity_to_add": -8}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(get_uri(state, "/api/products?category=Wearables").await).await;
        assert_eq!(body["products"][0]["id"], 2);
        assert_eq!(body["products"][0]["stock"], 0);
        assert_eq!(body["products"][0]["name"], "Smart Fitness Watch");
    }
}
