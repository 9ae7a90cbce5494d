//! Test Helpers

use jiff::Timestamp;

use crate::{
    domain::products::{
        ProductsService, ProductsServiceError,
        data::NewProduct,
        records::{ProductRecord, ProductUuid},
    },
    test::TestContext,
};

pub(crate) fn instant(value: &str) -> Timestamp {
    value.parse().expect("valid RFC 3339 timestamp")
}

pub(crate) async fn create_product(
    ctx: &TestContext,
    name: &str,
    category: Option<&str>,
    price: u64,
) -> Result<ProductRecord, ProductsServiceError> {
    ctx.products
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            name: name.to_string(),
            category: category.map(str::to_string),
            price,
        })
        .await
}
