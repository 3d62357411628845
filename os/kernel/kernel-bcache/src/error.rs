use crate::BlockKey;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("buffer {0} used without holding its lock")]
    NotHeld(BlockKey),
    #[error("no free buffer: all {slots} slots are referenced")]
    Exhausted { slots: usize },
    #[error("buffer {0} released more often than acquired")]
    Underflow(BlockKey),
}
