use std::{
    marker::Sized,
    path::Path,
};
use crate::error::{Error, Result};

pub trait Load
    where Self: Sized
{
    fn load<P>(filepath: P) -> Result<Self>
        where P: AsRef<Path>;
}

pub trait Save {
    fn save<P>(&self, filepath: P) -> Result<()>
        where P: AsRef<Path>;
}

pub fn read_entire_file<P>(filepath: P) -> Result<Vec<u8>>
    where P: AsRef<Path>
{
    use std::io::Read;

    let filepath = filepath.as_ref();
    let f = std::fs::File::open(filepath).map_err(|e| Error::io(filepath, e))?;
    let mut v = Vec::new();
    std::io::BufReader::new(f)
        .read_to_end(&mut v)
        .map_err(|e| Error::io(filepath, e))?;

    Ok(v)
}

pub fn write_entire_file<P>(filepath: P, bytes: &[u8]) -> Result<()>
    where P: AsRef<Path>
{
    use std::io::Write;

    let filepath = filepath.as_ref();
    let f = std::fs::File::create(filepath).map_err(|e| Error::io(filepath, e))?;
    let mut writer = std::io::BufWriter::new(f);
    writer
        .write_all(bytes)
        .and_then(|_| writer.flush())
        .map_err(|e| Error::io(filepath, e))
}

pub fn read_entire_string<P>(filepath: P) -> Result<String>
    where P: AsRef<Path>
{
    let filepath = filepath.as_ref();
    let bytes = read_entire_file(filepath)?;
    String::from_utf8(bytes).map_err(|e| {
        Error::io(filepath, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        write_entire_file(&path, b"atlas").unwrap();
        assert_eq!(read_entire_file(&path).unwrap(), b"atlas");
        assert_eq!(read_entire_string(&path).unwrap(), "atlas");
    }

    #[test]
    fn errors_carry_the_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.xml");
        match read_entire_file(&missing) {
            Err(Error::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected an I/O error, got {:?}", other),
        }

        let unwritable = dir.path().join("no_such_dir").join("out.xml");
        assert!(matches!(write_entire_file(&unwritable, b""), Err(Error::Io { .. })));

        let binary = dir.path().join("binary.xml");
        std::fs::write(&binary, [0xFF, 0xFE, 0x00]).unwrap();
        assert!(matches!(read_entire_string(&binary), Err(Error::Io { .. })));
    }
}
