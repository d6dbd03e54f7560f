//! Flat word-addressed memory with 16-bit wraparound.

use crate::fault::LoadError;

/// Number of 16-bit words in the architectural address space.
pub const ADDRESS_SPACE_WORDS: usize = u16::MAX as usize + 1;

/// 64 Ki-word memory owned by a machine.
///
/// Every address is a `u16`, so indexing can never leave the backing store.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    words: Box<[u16]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.words.iter().filter(|word| **word != 0).count();
        f.debug_struct("Memory")
            .field("words", &self.words.len())
            .field("non_zero", &used)
            .finish()
    }
}

impl Memory {
    /// Allocates a zeroed address space.
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: vec![0; ADDRESS_SPACE_WORDS].into_boxed_slice(),
        }
    }

    /// Reads the word at `addr`.
    #[must_use]
    pub fn read(&self, addr: u16) -> u16 {
        self.words[usize::from(addr)]
    }

    /// Writes `value` at `addr`.
    pub fn write(&mut self, addr: u16, value: u16) {
        self.words[usize::from(addr)] = value;
    }

    /// Copies `image` starting at `offset`, wrapping past `0xFFFF` to `0x0000`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ImageTooLarge`] when the image is longer than the
    /// address space; memory is left untouched in that case.
    pub fn load(&mut self, offset: u16, image: &[u16]) -> Result<(), LoadError> {
        if image.len() > ADDRESS_SPACE_WORDS {
            return Err(LoadError::ImageTooLarge { len: image.len() });
        }

        let mut addr = offset;
        for word in image {
            self.write(addr, *word);
            addr = addr.wrapping_add(1);
        }
        Ok(())
    }

    /// Zeroes every word.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Read-only view of the whole address space.
    #[must_use]
    pub fn as_slice(&self) -> &[u16] {
        &self.words
    }

    /// Mutable view of the whole address space for host-side patching.
    pub fn as_mut_slice(&mut self) -> &mut [u16] {
        &mut self.words
    }

    /// Reads `N` consecutive words starting at `addr`, wrapping at the end.
    #[must_use]
    pub fn read_window<const N: usize>(&self, addr: u16) -> [u16; N] {
        let mut window = [0; N];
        let mut cursor = addr;
        for slot in &mut window {
            *slot = self.read(cursor);
            cursor = cursor.wrapping_add(1);
        }
        window
    }
}
