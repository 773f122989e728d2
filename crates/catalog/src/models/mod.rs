pub mod brand;
pub mod category;
pub mod product;

pub use brand::Brand;
pub use category::Category;
pub use product::{NewProduct, Product, ProductPatch};
