//! Builders for synthetic corpus archives used by unit tests.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::Path;
use tar::{Builder, EntryType, Header};

pub enum Member<'a> {
    File(&'a str, &'a [u8]),
    Dir(&'a str),
    Link {
        name: &'a str,
        target: &'a str,
        kind: EntryType,
    },
}

pub fn write_tar_gz(path: &Path, files: &[(&str, &[u8])]) {
    let members: Vec<Member> = files
        .iter()
        .map(|(name, data)| Member::File(name, data))
        .collect();
    write_members(path, &members);
}

pub fn write_members(path: &Path, members: &[Member]) {
    let file = File::create(path).unwrap();
    let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

    for member in members {
        let mut header = Header::new_gnu();
        header.set_mode(0o644);
        match member {
            Member::File(name, data) => {
                header.set_entry_type(EntryType::Regular);
                header.set_size(data.len() as u64);
                builder.append_data(&mut header, name, *data).unwrap();
            }
            Member::Dir(name) => {
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                builder
                    .append_data(&mut header, name, std::io::empty())
                    .unwrap();
            }
            Member::Link { name, target, kind } => {
                header.set_entry_type(*kind);
                header.set_size(0);
                header.set_link_name(target).unwrap();
                builder
                    .append_data(&mut header, name, std::io::empty())
                    .unwrap();
            }
        }
    }

    builder.into_inner().unwrap().finish().unwrap();
}
