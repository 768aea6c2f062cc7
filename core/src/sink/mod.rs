pub mod r#trait;

pub use r#trait::{
    PairIndexLoader, RelationalSink, RowSource, VectorFetcher, VectorSink, WarehouseSink,
};
