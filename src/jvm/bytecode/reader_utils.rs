use std::io::{self, Read};

/// Extension of [`Read`] to decode big-endian values as they appear in class files.
pub(crate) trait BytecodeReader: Read {
    fn decode_value<T: Decode>(&mut self) -> io::Result<T>;
}

pub(crate) trait Decode {
    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self>
    where
        Self: Sized;
}

impl<R: Read + ?Sized> BytecodeReader for R {
    fn decode_value<T: Decode>(&mut self) -> io::Result<T> {
        T::decode(self)
    }
}

impl<const N: usize> Decode for [u8; N] {
    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; N];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }
}

macro_rules! impl_decode_for {
    ($($t:ty),*) => {
        $(
            impl Decode for $t {
                fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
                    let buf = reader.decode_value()?;
                    Ok(Self::from_be_bytes(buf))
                }
            }
        )*
    };
}

impl_decode_for!(u8, u16, u32, i8, i16, i32, i64, f32, f64);

/// Reads `len` bytes and advances the reader by `len` bytes.
pub(crate) fn read_byte_chunk<R>(reader: &mut R, len: usize) -> io::Result<Vec<u8>>
where
    R: Read + ?Sized,
{
    let mut buf = vec![0u8; len];
    reader.read_exact(buf.as_mut_slice())?;
    Ok(buf)
}

#[cfg(test)]
mod test {
    use super::{BytecodeReader, read_byte_chunk};

    #[test]
    fn read_bytes_success() {
        let mut reader = [0x01u8, 0x02, 0x03, 0x04].as_slice();
        let buf: [u8; 3] = reader.decode_value().unwrap();
        assert_eq!(buf, [0x01, 0x02, 0x03]);
        assert_eq!(reader, [0x04u8]);
    }

    #[test]
    fn read_bytes_failed() {
        let mut reader = [0x01u8, 0x02].as_slice();
        let err = reader.decode_value::<[u8; 3]>().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn read_u32_success() {
        let mut reader = [0x01u8, 0x02, 0x03, 0x04].as_slice();
        let buf: u32 = reader.decode_value().unwrap();
        assert_eq!(buf, 0x0102_0304);
        assert!(reader.is_empty());
    }

    #[test]
    fn read_i16_negative() {
        let mut reader = [0xFFu8, 0xFE].as_slice();
        let buf: i16 = reader.decode_value().unwrap();
        assert_eq!(buf, -2);
        assert!(reader.is_empty());
    }

    #[test]
    fn read_u16_failed() {
        let mut reader = [0x01u8].as_slice();
        let err = reader.decode_value::<u16>().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn read_i8_success() {
        let mut reader = [0x80u8].as_slice();
        let buf: i8 = reader.decode_value().unwrap();
        assert_eq!(buf, i8::MIN);
        assert!(reader.is_empty());
    }

    #[test]
    fn read_bytes_vec_success() {
        let mut reader = [0x01u8, 0x02, 0x03, 0x04].as_slice();
        let buf: Vec<u8> = read_byte_chunk(&mut reader, 3).unwrap();
        assert_eq!(buf, [0x01, 0x02, 0x03]);
        assert_eq!(reader, [0x04u8]);
    }

    #[test]
    fn read_bytes_vec_failed() {
        let mut reader = [0x01u8, 0x02].as_slice();
        let err = read_byte_chunk(&mut reader, 3).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
