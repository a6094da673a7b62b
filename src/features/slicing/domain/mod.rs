//! `SlicerStatistics` (spec §4.7's output): counts of what a sweep touched,
//! grounded in `examples/original_source/src/analysis/Slicing.h`'s
//! `SlicerStatistics`.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlicerStatistics {
    pub nodes_total: u64,
    pub nodes_removed: u64,
    pub blocks_removed: u32,
}
