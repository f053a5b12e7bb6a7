//! Bounded accumulator for partially received records

/// The receive buffer is at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferFull;

/// Byte accumulator over caller-provided storage
///
/// The length never exceeds the storage capacity; a push into a full buffer
/// fails and leaves the contents unchanged.
#[derive(Debug)]
pub struct ReceiveBuffer<'a> {
    storage: &'a mut [u8],
    len: usize,
}

impl<'a> ReceiveBuffer<'a> {
    /// Create an empty buffer over `storage`
    pub fn new(storage: &'a mut [u8]) -> Self {
        Self { storage, len: 0 }
    }

    /// Append one byte
    pub fn push(&mut self, byte: u8) -> Result<(), BufferFull> {
        let slot = self.storage.get_mut(self.len).ok_or(BufferFull)?;
        *slot = byte;
        self.len += 1;
        Ok(())
    }

    /// Discard all accumulated bytes
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Accumulated bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn is_full(&self) -> bool {
        self.len == self.storage.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut storage = [0u8; 3];
        let mut buf = ReceiveBuffer::new(&mut storage);

        assert!(buf.is_empty());
        for b in 1..=3 {
            buf.push(b).unwrap();
        }
        assert!(buf.is_full());
        assert_eq!(buf.push(4), Err(BufferFull));
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_clear_resets_cursor() {
        let mut storage = [0u8; 2];
        let mut buf = ReceiveBuffer::new(&mut storage);
        buf.push(7).unwrap();
        buf.clear();
        assert_eq!(buf.len(), 0);
        buf.push(9).unwrap();
        assert_eq!(buf.as_slice(), &[9]);
    }
}
