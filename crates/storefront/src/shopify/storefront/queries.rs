//! GraphQL query definitions for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing [`GraphQLQuery`] with a
//! module of the same name (snake case) holding its `Variables` and
//! `ResponseData`, the same layout `graphql_client` codegen produces.

use graphql_client::{GraphQLQuery, QueryBody};

// Scalar types as Shopify serializes them
#[allow(clippy::upper_case_acronyms)]
type Decimal = String;
#[allow(clippy::upper_case_acronyms)]
type URL = String;

/// Selection set shared by every cart operation.
macro_rules! cart_fields {
    () => {
        r"
fragment CartFields on Cart {
  id
  checkoutUrl
  cost {
    totalAmount { amount currencyCode }
  }
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        cost {
          amountPerQuantity { amount currencyCode }
        }
        merchandise {
          ... on ProductVariant {
            id
            title
            product { title }
          }
        }
      }
    }
  }
}
"
    };
}

/// Shapes shared between operations.
pub mod fragments {
    use serde::Deserialize;

    use super::{Decimal, URL};

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MoneyV2 {
        pub amount: Decimal,
        pub currency_code: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Edges<T> {
        pub edges: Vec<Edge<T>>,
    }

    impl<T> Edges<T> {
        /// Node of the first edge, if any.
        pub fn into_first(self) -> Option<T> {
            self.edges.into_iter().next().map(|e| e.node)
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Edge<T> {
        pub node: T,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageInfo {
        pub has_next_page: bool,
        pub end_cursor: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartFields {
        pub id: String,
        pub checkout_url: URL,
        pub cost: CartCost,
        pub lines: Edges<CartLineNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartCost {
        pub total_amount: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineNode {
        pub id: String,
        pub quantity: u32,
        pub cost: Option<CartLineCost>,
        pub merchandise: CartMerchandise,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineCost {
        pub amount_per_quantity: MoneyV2,
    }

    /// `merchandise` is a union; only `ProductVariant` fields are selected.
    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct CartMerchandise {
        #[serde(default)]
        pub id: String,
        #[serde(default)]
        pub title: String,
        pub product: Option<CartMerchandiseProduct>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CartMerchandiseProduct {
        pub title: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CartUserError {
        pub field: Option<Vec<String>>,
        pub message: String,
    }

    /// Payload shared by `cartCreate`, `cartLinesAdd`, `cartLinesUpdate` and
    /// `cartLinesRemove`.
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartPayload {
        pub cart: Option<CartFields>,
        #[serde(default)]
        pub user_errors: Vec<CartUserError>,
    }

    #[derive(Debug, Clone, serde::Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineInput {
        pub merchandise_id: String,
        pub quantity: i64,
    }
}

// =============================================================================
// Product queries
// =============================================================================

pub struct GetProducts;

pub mod get_products {
    use serde::{Deserialize, Serialize};

    use super::URL;
    use super::fragments::{Edges, MoneyV2, PageInfo};

    pub const OPERATION_NAME: &str = "GetProducts";
    pub const QUERY: &str = r"
query GetProducts($first: Int!, $after: String) {
  products(first: $first, after: $after) {
    edges {
      node {
        id
        title
        description
        handle
        priceRange {
          minVariantPrice { amount currencyCode }
        }
        images(first: 1) {
          edges { node { url altText } }
        }
        variants(first: 1) {
          edges { node { id availableForSale } }
        }
      }
    }
    pageInfo { hasNextPage endCursor }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: GetProductsProducts,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GetProductsProducts {
        pub edges: Vec<super::fragments::Edge<GetProductsProductsNode>>,
        pub page_info: PageInfo,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GetProductsProductsNode {
        pub id: String,
        pub title: String,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub handle: String,
        pub price_range: PriceRange,
        pub images: Edges<ImageNode>,
        pub variants: Edges<VariantNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRange {
        pub min_variant_price: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ImageNode {
        pub url: URL,
        pub alt_text: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VariantNode {
        pub id: String,
        #[serde(default)]
        pub available_for_sale: bool,
    }
}

impl GraphQLQuery for GetProducts {
    type Variables = get_products::Variables;
    type ResponseData = get_products::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_products::QUERY,
            operation_name: get_products::OPERATION_NAME,
        }
    }
}

// =============================================================================
// Cart mutations and queries
// =============================================================================

pub struct CreateCart;

pub mod create_cart {
    use serde::{Deserialize, Serialize};

    pub use super::fragments::CartLineInput;
    use super::fragments::CartPayload;

    pub const OPERATION_NAME: &str = "CreateCart";
    pub const QUERY: &str = concat!(
        r"
mutation CreateCart($input: CartInput!) {
  cartCreate(input: $input) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
",
        cart_fields!()
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartPayload>,
    }
}

impl GraphQLQuery for CreateCart {
    type Variables = create_cart::Variables;
    type ResponseData = create_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: create_cart::QUERY,
            operation_name: create_cart::OPERATION_NAME,
        }
    }
}

pub struct GetCart;

pub mod get_cart {
    use serde::{Deserialize, Serialize};

    use super::fragments::CartFields;

    pub const OPERATION_NAME: &str = "GetCart";
    pub const QUERY: &str = concat!(
        r"
query GetCart($cartId: ID!) {
  cart(id: $cartId) { ...CartFields }
}
",
        cart_fields!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartFields>,
    }
}

impl GraphQLQuery for GetCart {
    type Variables = get_cart::Variables;
    type ResponseData = get_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_cart::QUERY,
            operation_name: get_cart::OPERATION_NAME,
        }
    }
}

pub struct AddToCart;

pub mod add_to_cart {
    use serde::{Deserialize, Serialize};

    pub use super::fragments::CartLineInput;
    use super::fragments::CartPayload;

    pub const OPERATION_NAME: &str = "AddToCart";
    pub const QUERY: &str = concat!(
        r"
mutation AddToCart($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
",
        cart_fields!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartPayload>,
    }
}

impl GraphQLQuery for AddToCart {
    type Variables = add_to_cart::Variables;
    type ResponseData = add_to_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: add_to_cart::QUERY,
            operation_name: add_to_cart::OPERATION_NAME,
        }
    }
}

pub struct UpdateCartLines;

pub mod update_cart_lines {
    use serde::{Deserialize, Serialize};

    use super::fragments::CartPayload;

    pub const OPERATION_NAME: &str = "UpdateCartLines";
    pub const QUERY: &str = concat!(
        r"
mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
",
        cart_fields!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CartLineUpdateInput {
        pub id: String,
        pub quantity: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartPayload>,
    }
}

impl GraphQLQuery for UpdateCartLines {
    type Variables = update_cart_lines::Variables;
    type ResponseData = update_cart_lines::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: update_cart_lines::QUERY,
            operation_name: update_cart_lines::OPERATION_NAME,
        }
    }
}

pub struct RemoveFromCart;

pub mod remove_from_cart {
    use serde::{Deserialize, Serialize};

    use super::fragments::CartPayload;

    pub const OPERATION_NAME: &str = "RemoveFromCart";
    pub const QUERY: &str = concat!(
        r"
mutation RemoveFromCart($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { field message }
  }
}
",
        cart_fields!()
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartPayload>,
    }
}

impl GraphQLQuery for RemoveFromCart {
    type Variables = remove_from_cart::Variables;
    type ResponseData = remove_from_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: remove_from_cart::QUERY,
            operation_name: remove_from_cart::OPERATION_NAME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_operations_include_fragment() {
        for query in [
            create_cart::QUERY,
            get_cart::QUERY,
            add_to_cart::QUERY,
            update_cart_lines::QUERY,
            remove_from_cart::QUERY,
        ] {
            assert!(query.contains("...CartFields"));
            assert!(query.contains("fragment CartFields on Cart"));
        }
    }

    #[test]
    fn test_variables_serialize_camel_case() {
        let body = RemoveFromCart::build_query(remove_from_cart::Variables {
            cart_id: "gid://shopify/Cart/c1".to_string(),
            line_ids: vec!["gid://shopify/CartLine/1".to_string()],
        });
        let json = serde_json::to_value(&body).expect("serialize");

        assert_eq!(json["operationName"], "RemoveFromCart");
        assert_eq!(json["variables"]["cartId"], "gid://shopify/Cart/c1");
        assert_eq!(json["variables"]["lineIds"][0], "gid://shopify/CartLine/1");
    }

    #[test]
    fn test_cart_line_input_serializes_merchandise_id() {
        let vars = create_cart::Variables {
            input: create_cart::CartInput {
                lines: vec![create_cart::CartLineInput {
                    merchandise_id: "gid://shopify/ProductVariant/9".to_string(),
                    quantity: 2,
                }],
            },
        };
        let json = serde_json::to_value(&vars).expect("serialize");
        assert_eq!(
            json["input"]["lines"][0]["merchandiseId"],
            "gid://shopify/ProductVariant/9"
        );
        assert_eq!(json["input"]["lines"][0]["quantity"], 2);
    }

    #[test]
    fn test_products_response_tolerates_missing_image_and_variant() {
        let data: get_products::ResponseData = serde_json::from_value(serde_json::json!({
            "products": {
                "edges": [{
                    "node": {
                        "id": "gid://shopify/Product/1",
                        "title": "Mug",
                        "handle": "mug",
                        "priceRange": { "minVariantPrice": { "amount": "8.0", "currencyCode": "USD" } },
                        "images": { "edges": [] },
                        "variants": { "edges": [] }
                    }
                }],
                "pageInfo": { "hasNextPage": false, "endCursor": null }
            }
        }))
        .expect("deserialize");

        let node = &data.products.edges[0].node;
        assert!(node.description.is_none());
        assert!(node.images.edges.is_empty());
        assert!(!data.products.page_info.has_next_page);
    }
}
