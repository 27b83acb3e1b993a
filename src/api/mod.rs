pub mod pagination;

pub use pagination::{Paginated, Pagination, PaginationMeta};
