//! Product type conversion functions.

use shopease_core::{CatalogEntry, Money};

use crate::shopify::types::{PageInfo, ProductPage};

use super::super::queries::get_products;

/// Convert a `products` connection into a page of catalog entries.
pub fn convert_product_page(products: get_products::GetProductsProducts) -> ProductPage {
    ProductPage {
        entries: products
            .edges
            .into_iter()
            .map(|edge| convert_product(edge.node))
            .collect(),
        page_info: PageInfo {
            has_next_page: products.page_info.has_next_page,
            end_cursor: products.page_info.end_cursor,
        },
    }
}

/// Flatten a product node into a catalog entry.
///
/// Only the first image and first variant are kept. A product without
/// variants gets an empty variant id and is not available for sale.
pub fn convert_product(node: get_products::GetProductsProductsNode) -> CatalogEntry {
    let price = node.price_range.min_variant_price;
    let money = Money::parse(&price.amount, price.currency_code);
    let image = node.images.into_first();
    let variant = node.variants.into_first();

    let image_alt = image
        .as_ref()
        .and_then(|i| i.alt_text.clone())
        .filter(|alt| !alt.is_empty())
        .unwrap_or_else(|| node.title.clone());

    CatalogEntry {
        id: node.id,
        title: node.title,
        description: node.description.unwrap_or_default(),
        handle: node.handle,
        price: money.amount,
        currency: money.currency_code,
        image: image.map(|i| i.url).filter(|url| !url.is_empty()),
        image_alt,
        variant_id: variant.as_ref().map(|v| v.id.clone()).unwrap_or_default(),
        available_for_sale: variant.is_some_and(|v| v.available_for_sale),
    }
}
