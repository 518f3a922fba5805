/// An error of a buffer operation.
///
/// Every fallible operation reports through this one enum and leaves the
/// buffer it ran on valid and unchanged.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The allocator refused to hand out the memory.
    #[error("allocation of {size} bytes failed")]
    Alloc {
        /// Size of the rejected request.
        size: usize,
    },

    /// The requested size can't be encoded.
    ///
    /// Either it exceeds what the widest header fields can hold or the
    /// allocator's layout limits. Note that the limit sits far above
    /// practical usability limits, as this type optimises for many small
    /// strings, not for multi-gigabyte behemoths.
    #[error("too long to encode")]
    TooLong,

    /// Splitting by an empty separator.
    #[error("empty separator")]
    EmptySeparator,

    /// Byte substitution with sets of different lengths.
    #[error("substitution sets differ in length")]
    MismatchedMapSets,

    /// A formatting trait reported an error of its own while appending.
    #[error("formatting failed")]
    Format,

    /// Unbalanced or misplaced quotes in an argument line.
    #[error("unbalanced quotes in argument line")]
    UnbalancedQuotes,
}
