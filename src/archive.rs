//! # ZIP Container Writer
//!
//! A minimal, append-only ZIP writer for export bundles: local file headers,
//! a central directory, and the end-of-central-directory record, with entries
//! deflate-compressed through `miniz_oxide`. Writing is single-pass and fully
//! in memory; bundles are capped well below anything that needs streaming or
//! ZIP64.
//!
//! Entry timestamps are fixed at the DOS epoch so that identical inputs
//! produce byte-identical archives.

use miniz_oxide::deflate::compress_to_vec;

const LOCAL_FILE_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_DIR_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIR_SIG: u32 = 0x0605_4b50;

/// Version 2.0 — deflate support, no ZIP64.
const ZIP_VERSION: u16 = 20;
const METHOD_DEFLATE: u16 = 8;

struct CentralEntry {
    name: Vec<u8>,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    local_header_offset: u32,
}

/// Append-only ZIP archive builder.
pub struct ZipWriter {
    buf: Vec<u8>,
    entries: Vec<CentralEntry>,
}

impl ZipWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Add one file entry. `path` uses forward slashes for directories
    /// ("pdf/cert_rev2.pdf"); directories need no entries of their own.
    pub fn add_file(&mut self, path: &str, data: &[u8]) {
        let compressed = compress_to_vec(data, 6);
        let crc = crc32(data);
        let name = path.as_bytes().to_vec();
        let offset = self.buf.len() as u32;

        write_u32(&mut self.buf, LOCAL_FILE_HEADER_SIG);
        write_u16(&mut self.buf, ZIP_VERSION);
        write_u16(&mut self.buf, 0); // general purpose flags
        write_u16(&mut self.buf, METHOD_DEFLATE);
        write_u16(&mut self.buf, 0); // mod time (DOS epoch)
        write_u16(&mut self.buf, 0x21); // mod date: 1980-01-01
        write_u32(&mut self.buf, crc);
        write_u32(&mut self.buf, compressed.len() as u32);
        write_u32(&mut self.buf, data.len() as u32);
        write_u16(&mut self.buf, name.len() as u16);
        write_u16(&mut self.buf, 0); // extra field length
        self.buf.extend_from_slice(&name);
        self.buf.extend_from_slice(&compressed);

        self.entries.push(CentralEntry {
            name,
            crc32: crc,
            compressed_size: compressed.len() as u32,
            uncompressed_size: data.len() as u32,
            local_header_offset: offset,
        });
    }

    /// Write the central directory and EOCD record, returning the finished
    /// archive bytes.
    pub fn finish(mut self) -> Vec<u8> {
        let central_start = self.buf.len() as u32;

        for entry in &self.entries {
            write_u32(&mut self.buf, CENTRAL_DIR_SIG);
            write_u16(&mut self.buf, ZIP_VERSION); // version made by
            write_u16(&mut self.buf, ZIP_VERSION); // version needed
            write_u16(&mut self.buf, 0); // flags
            write_u16(&mut self.buf, METHOD_DEFLATE);
            write_u16(&mut self.buf, 0); // mod time
            write_u16(&mut self.buf, 0x21); // mod date
            write_u32(&mut self.buf, entry.crc32);
            write_u32(&mut self.buf, entry.compressed_size);
            write_u32(&mut self.buf, entry.uncompressed_size);
            write_u16(&mut self.buf, entry.name.len() as u16);
            write_u16(&mut self.buf, 0); // extra field length
            write_u16(&mut self.buf, 0); // comment length
            write_u16(&mut self.buf, 0); // disk number start
            write_u16(&mut self.buf, 0); // internal attributes
            write_u32(&mut self.buf, 0); // external attributes
            write_u32(&mut self.buf, entry.local_header_offset);
            self.buf.extend_from_slice(&entry.name);
        }

        let central_size = self.buf.len() as u32 - central_start;
        let entry_count = self.entries.len() as u16;

        write_u32(&mut self.buf, END_OF_CENTRAL_DIR_SIG);
        write_u16(&mut self.buf, 0); // this disk
        write_u16(&mut self.buf, 0); // central dir disk
        write_u16(&mut self.buf, entry_count);
        write_u16(&mut self.buf, entry_count);
        write_u32(&mut self.buf, central_size);
        write_u32(&mut self.buf, central_start);
        write_u16(&mut self.buf, 0); // comment length

        self.buf
    }
}

impl Default for ZipWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// CRC-32 (IEEE 802.3 polynomial, reflected), as the ZIP format requires.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_check_value() {
        // Standard CRC-32 check vector.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn test_empty_archive_is_just_eocd() {
        let bytes = ZipWriter::new().finish();
        assert_eq!(bytes.len(), 22);
        assert_eq!(&bytes[0..4], &END_OF_CENTRAL_DIR_SIG.to_le_bytes());
    }

    #[test]
    fn test_archive_structure_signatures() {
        let mut zip = ZipWriter::new();
        zip.add_file("a.txt", b"hello world hello world hello world");
        zip.add_file("dir/b.txt", b"second entry");
        let bytes = zip.finish();

        assert_eq!(&bytes[0..4], &LOCAL_FILE_HEADER_SIG.to_le_bytes());

        // EOCD is the last 22 bytes (no comment).
        let eocd = &bytes[bytes.len() - 22..];
        assert_eq!(&eocd[0..4], &END_OF_CENTRAL_DIR_SIG.to_le_bytes());
        let entry_count = u16::from_le_bytes([eocd[8], eocd[9]]);
        assert_eq!(entry_count, 2);

        let central_offset = u32::from_le_bytes([eocd[16], eocd[17], eocd[18], eocd[19]]) as usize;
        assert_eq!(&bytes[central_offset..central_offset + 4], &CENTRAL_DIR_SIG.to_le_bytes());
    }

    #[test]
    fn test_round_trip_entry_data() {
        let payload = b"the quick brown fox jumps over the lazy dog".repeat(10);
        let mut zip = ZipWriter::new();
        zip.add_file("fox.txt", &payload);
        let bytes = zip.finish();

        // Parse the single local header by hand.
        let crc = u32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]);
        let csize = u32::from_le_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]) as usize;
        let usize_ = u32::from_le_bytes([bytes[22], bytes[23], bytes[24], bytes[25]]) as usize;
        let name_len = u16::from_le_bytes([bytes[26], bytes[27]]) as usize;
        assert_eq!(usize_, payload.len());
        assert_eq!(crc, crc32(&payload));

        let data_start = 30 + name_len;
        let inflated =
            miniz_oxide::inflate::decompress_to_vec(&bytes[data_start..data_start + csize])
                .unwrap();
        assert_eq!(inflated, payload);
    }

    #[test]
    fn test_deterministic_output() {
        let build = || {
            let mut zip = ZipWriter::new();
            zip.add_file("one.json", br#"{"a":1}"#);
            zip.add_file("two.json", br#"{"b":2}"#);
            zip.finish()
        };
        assert_eq!(build(), build());
    }
}
