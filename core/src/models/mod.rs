//! Record types flowing through a sync run: warehouse rows in, vectors from
//! the item index, and the three prepared row families out.

pub mod metadata;
pub mod records;
pub mod row;
pub mod vector;

pub use metadata::{Metadata, ITEM_ID_KEY, USER_ID_KEY};
pub use records::{PreparedRecords, RelationalRow, VectorRecord, WarehouseRow};
pub use row::{group_by_user, InteractionRow, InteractionType, UserRows};
pub use vector::Vector;
