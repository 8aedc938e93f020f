use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  /// An access past the end of the 64KB address space.
  #[error("address {addr:#07x} is outside the 64KB address space")]
  AddressOutOfRange { addr: usize },

  /// A push with fewer than two bytes left below SP.
  #[error("stack overflow: cannot push below address 0 (sp={sp:#06x})")]
  StackOverflow { sp: u16 },

  #[error("image of {len} bytes does not fit at offset {offset:#06x}")]
  ImageTooLarge { offset: usize, len: usize },
}
