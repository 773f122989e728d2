//! Table and column identifiers for SeaQuery statements.

use sea_query::Iden;

#[derive(Iden, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Products {
    Table,
    Id,
    Name,
    Description,
    Price,
    OldPrice,
    Discount,
    Rating,
    Gender,
    Image,
    Brands,
    Occasions,
    Colors,
    CreatedAt,
}

impl Products {
    /// Every column, in the field order of [`crate::models::Product`].
    pub const COLUMNS: [Products; 13] = [
        Products::Id,
        Products::Name,
        Products::Description,
        Products::Price,
        Products::OldPrice,
        Products::Discount,
        Products::Rating,
        Products::Gender,
        Products::Image,
        Products::Brands,
        Products::Occasions,
        Products::Colors,
        Products::CreatedAt,
    ];
}

#[derive(Iden, Clone, Copy, Debug)]
pub enum ProductCategories {
    Table,
    ProductId,
    CategoryId,
}
