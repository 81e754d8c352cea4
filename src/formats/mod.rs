//! File format adapters
//!
//! Adapters for annotation formats that can be transferred between assemblies.

pub mod tbl;

pub use tbl::{
    convert_tbl, split_records, ConversionStats, CoordinateLine, FeatureState, HeaderLine,
    HeaderStyle, LineKind, TblLine, TblTransfer, TransferContext, TransferOptions,
};
