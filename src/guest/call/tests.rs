// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::guest::{PageList, Phys, PhysMut};
use crate::item::shfl::{
    string_len, CreateFlags, CreateParms, InfoFlags, ListFlags, ObjInfo, RemoveFlags, ShflStr,
    VolInfo,
};
use crate::item::{ByteSized, Direction, PageListHeader, ParmType, MAX_PAGES, PARMS_OFFSET};
use crate::status::{VERR_FILE_NOT_FOUND, VERR_INVALID_PARAMETER, VERR_OUT_OF_RANGE};
use crate::{NIL_PHYS, PAGE_SIZE};

const ALL: [Features; 4] = [
    Features::empty(),
    Features::EMBEDDED_BUFFERS,
    Features::CONTIGUOUS_PAGE_LIST,
    Features::all(),
];

const SESSION: Session = Session {
    handle: 0,
    client_id: 42,
};

/// Stages `call` and returns the block length along with the staged parameters.
fn stage<'a, T: Call<'a>>(call: T, features: Features) -> Result<(usize, Vec<Parameter>)> {
    let mut alloc = Alloc::new();
    let staged = StagedCall::stage(call, &mut alloc, features)?;
    Ok((alloc.len(), staged.parms().to_vec()))
}

fn parms_end(n: usize) -> usize {
    PARMS_OFFSET + n * PARM_SIZE
}

/// Page lists are aligned to 8 bytes within the block.
fn align8(offset: usize) -> usize {
    (offset + 7) & !7
}

#[test]
fn scalar_calls() {
    for features in ALL {
        let (len, parms) = stage(Close { root: 1, handle: 2 }, features).unwrap();
        assert_eq!(len, parms_end(2));
        assert_eq!(parms, [Parameter::U32(1), Parameter::U64(2)]);

        let (len, _) = stage(Flush { root: 1, handle: 2 }, features).unwrap();
        assert_eq!(len, parms_end(2));

        let call = SetFileSize {
            root: 1,
            handle: 2,
            size: 1 << 40,
        };
        let (len, parms) = stage(call, features).unwrap();
        assert_eq!(len, parms_end(3));
        assert_eq!(parms[2], Parameter::U64(1 << 40));

        let (len, parms) = stage(UnmapFolder { root: 3 }, features).unwrap();
        assert_eq!(len, parms_end(1));
        assert_eq!(parms, [Parameter::U32(3)]);
    }
}

#[test]
fn map_folder_encodings() {
    let name = [3u8, 0, 1, 0, b'x', 0, 0];
    let call = |phys| MapFolder {
        name: Phys::new(&name, phys),
        delimiter: u16::from(b'/'),
        case_sensitive: true,
    };

    let (len, parms) = stage(call(0x2_0010), Features::CONTIGUOUS_PAGE_LIST).unwrap();
    assert_eq!(
        parms,
        [
            Parameter::PageList {
                size: name.len() as _,
                offset: (align8(parms_end(4)) - PREFIX_SIZE) as _,
            },
            Parameter::U32(u32::MAX),
            Parameter::U32(b'/' as _),
            Parameter::U32(1),
        ]
    );
    assert_eq!(len, align8(parms_end(4)) + 8 + 8);

    // Never embedded.
    let (len, parms) = stage(call(0x2_0010), Features::EMBEDDED_BUFFERS).unwrap();
    assert_eq!(parms[0].kind(), ParmType::LinAddrIn);
    assert_eq!(len, parms_end(4));

    // Names crossing a page boundary fall back to a linear address.
    let (len, parms) = stage(call(0x2_0ffe), Features::CONTIGUOUS_PAGE_LIST).unwrap();
    assert_eq!(parms[0].kind(), ParmType::LinAddrIn);
    assert_eq!(len, parms_end(4));
}

#[test]
fn create_lengths() {
    let mut raw = [0u8; 16];
    let path = ShflStr::encode(&mut raw, b"a/b").unwrap();
    let mut parms = CreateParms::new(CreateFlags::ACT_FAIL_IF_NEW);

    for features in ALL {
        let call = Create {
            root: 1,
            path,
            parms: &mut parms,
        };
        let (len, staged) = stage(call, features).unwrap();
        if features.contains(Features::EMBEDDED_BUFFERS) {
            // Create parameters are aligned to 8 bytes.
            let parms_at = align8(parms_end(3));
            let path_at = parms_at + CreateParms::SIZE;
            assert_eq!(len, path_at + string_len(3));
            assert_eq!(
                staged[1],
                Parameter::Embedded {
                    dir: Direction::TO_HOST,
                    size: string_len(3) as _,
                    offset: (path_at - PREFIX_SIZE) as _,
                }
            );
            assert_eq!(
                staged[2],
                Parameter::Embedded {
                    dir: Direction::BOTH,
                    size: CreateParms::SIZE as _,
                    offset: (parms_at - PREFIX_SIZE) as _,
                }
            );
        } else {
            assert_eq!(len, parms_end(3));
            assert_eq!(staged[1].kind(), ParmType::LinAddrIn);
            assert_eq!(staged[2].kind(), ParmType::LinAddr);
        }
    }
}

#[test]
fn info_flags() {
    let mut vol = VolInfo::default();
    let mut info = ObjInfo::default();
    for features in ALL {
        let embedded = features.contains(Features::EMBEDDED_BUFFERS);
        let info_at = align8(parms_end(5));

        let call = QueryVolInfo {
            root: 1,
            handle: 2,
            info: &mut vol,
        };
        let (len, parms) = stage(call, features).unwrap();
        assert_eq!(
            parms[2],
            Parameter::U32((InfoFlags::VOLUME | InfoFlags::GET).bits())
        );
        assert_eq!(parms[3], Parameter::U32(VolInfo::SIZE as _));
        if embedded {
            assert_eq!(len, info_at + VolInfo::SIZE);
            assert_eq!(
                parms[4],
                Parameter::Embedded {
                    dir: Direction::FROM_HOST,
                    size: VolInfo::SIZE as _,
                    offset: (info_at - PREFIX_SIZE) as _,
                }
            );
        } else {
            assert_eq!(len, parms_end(5));
            assert_eq!(parms[4].kind(), ParmType::LinAddrOut);
        }

        let call = QueryObjInfo {
            root: 1,
            handle: 2,
            info: &mut info,
        };
        let (len, parms) = stage(call, features).unwrap();
        assert_eq!(parms[2], Parameter::U32(InfoFlags::FILE.bits()));
        assert_eq!(parms[3], Parameter::U32(96));
        if embedded {
            assert_eq!(len, info_at + ObjInfo::SIZE);
            assert_eq!(
                parms[4],
                Parameter::Embedded {
                    dir: Direction::FROM_HOST,
                    size: ObjInfo::SIZE as _,
                    offset: (info_at - PREFIX_SIZE) as _,
                }
            );
        } else {
            assert_eq!(len, parms_end(5));
            assert_eq!(parms[4].kind(), ParmType::LinAddrOut);
        }

        let call = SetObjInfo {
            root: 1,
            handle: 2,
            info: &mut info,
        };
        let (len, parms) = stage(call, features).unwrap();
        assert_eq!(
            parms[2],
            Parameter::U32((InfoFlags::FILE | InfoFlags::SET).bits())
        );
        if embedded {
            assert_eq!(len, info_at + ObjInfo::SIZE);
            assert_eq!(
                parms[4],
                Parameter::Embedded {
                    dir: Direction::BOTH,
                    size: ObjInfo::SIZE as _,
                    offset: (info_at - PREFIX_SIZE) as _,
                }
            );
        } else {
            assert_eq!(len, parms_end(5));
            assert_eq!(parms[4].kind(), ParmType::LinAddr);
        }
    }
}

#[test]
fn set_obj_info_with_buf() {
    let mut buf = [0u8; 256];

    let call = SetObjInfoWithBuf {
        root: 1,
        handle: 2,
        buf: PhysMut::new(&mut buf, 0x3_0f00),
        offset: 0x20,
    };
    let (len, parms) = stage(call, Features::CONTIGUOUS_PAGE_LIST).unwrap();
    assert_eq!(
        parms[4],
        Parameter::ContiguousPageList {
            size: ObjInfo::SIZE as _,
            offset: (align8(parms_end(5)) - PREFIX_SIZE) as _,
        }
    );
    assert_eq!(len, align8(parms_end(5)) + 8 + 8);

    for features in [Features::empty(), Features::EMBEDDED_BUFFERS] {
        let call = SetObjInfoWithBuf {
            root: 1,
            handle: 2,
            buf: PhysMut::new(&mut buf, 0x3_0f00),
            offset: 0x20,
        };
        let (len, parms) = stage(call, features).unwrap();
        assert_eq!(len, parms_end(5));
        assert_eq!(parms[4].kind(), ParmType::LinAddr);
    }

    let call = SetObjInfoWithBuf {
        root: 1,
        handle: 2,
        buf: PhysMut::new(&mut buf, 0x3_0f00),
        offset: 256 - ObjInfo::SIZE + 1,
    };
    assert_eq!(
        stage(call, Features::CONTIGUOUS_PAGE_LIST).err(),
        Some(VERR_INVALID_PARAMETER)
    );
}

#[test]
fn remove_and_rename() {
    let mut raw = [0u8; 16];
    let path = ShflStr::encode(&mut raw, b"old").unwrap();
    let src = [5u8, 0, 3, 0, b'n', b'e', b'w', 0, 0];

    for features in ALL {
        let call = Remove {
            root: 1,
            path,
            flags: RemoveFlags::FILE,
        };
        let (len, parms) = stage(call, features).unwrap();
        assert_eq!(parms[2], Parameter::U32(1));
        if features.contains(Features::EMBEDDED_BUFFERS) {
            assert_eq!(len, parms_end(3) + path.len());
        } else {
            assert_eq!(len, parms_end(3));
        }

        let call = Rename {
            root: 1,
            src: Phys::new(&src, 0x4_0000),
            dst: path,
            flags: Default::default(),
        };
        let (len, parms) = stage(call, features).unwrap();
        let mut end = parms_end(4);
        if features.contains(Features::EMBEDDED_BUFFERS) {
            assert_eq!(parms[2].kind(), ParmType::Embedded);
            end += path.len();
        }
        if features.contains(Features::CONTIGUOUS_PAGE_LIST) {
            end = align8(end) + 16;
            assert_eq!(
                parms[1],
                Parameter::ContiguousPageList {
                    size: src.len() as _,
                    offset: (end - 16 - PREFIX_SIZE) as _,
                }
            );
        }
        assert_eq!(len, end);
    }
}

#[test]
fn read_embedded_length() {
    let mut buf = [0u8; 13];
    let call = ReadEmbedded {
        root: 1,
        handle: 2,
        offset: 0x1234,
        buf: &mut buf,
    };
    let (len, parms) = stage(call, Features::EMBEDDED_BUFFERS).unwrap();
    assert_eq!(len, PREFIX_SIZE + 44 + 5 * 16 + 13);
    assert_eq!(parms[2], Parameter::U64(0x1234));
    assert_eq!(parms[3], Parameter::U32(13));
    assert_eq!(
        parms[4],
        Parameter::Embedded {
            dir: Direction::FROM_HOST,
            size: 13,
            offset: (parms_end(5) - PREFIX_SIZE) as _,
        }
    );

    let call = ReadEmbedded {
        root: 1,
        handle: 2,
        offset: 0x1234,
        buf: &mut buf,
    };
    let (len, parms) = stage(call, Features::CONTIGUOUS_PAGE_LIST).unwrap();
    assert_eq!(len, parms_end(5));
    assert_eq!(parms[4].kind(), ParmType::LinAddrOut);
}

#[test]
fn page_list_checks() {
    let pages = [0x1000u64, 0x3000, 0x7000];
    let list = PageList::new(0x10, &pages).unwrap();

    for features in ALL {
        let call = WritePageList {
            root: 1,
            handle: 2,
            offset: 0,
            len: (3 * PAGE_SIZE - 0x10) as _,
            pages: list,
        };
        let (len, parms) = stage(call, features).unwrap();
        assert_eq!(len, align8(parms_end(5)) + 8 + 3 * 8);
        assert_eq!(
            parms[4],
            Parameter::PageList {
                size: (3 * PAGE_SIZE - 0x10) as _,
                offset: (align8(parms_end(5)) - PREFIX_SIZE) as _,
            }
        );

        let call = ReadPageList {
            root: 1,
            handle: 2,
            offset: 0,
            len: (3 * PAGE_SIZE) as _,
            pages: list,
        };
        assert_eq!(stage(call, features).err(), Some(VERR_INVALID_PARAMETER));
    }

    let many = vec![0u64; MAX_PAGES + 1];
    let call = ReadPageList {
        root: 1,
        handle: 2,
        offset: 0,
        len: 0,
        pages: PageList::new(0, &many).unwrap(),
    };
    assert_eq!(stage(call, Features::empty()).err(), Some(VERR_OUT_OF_RANGE));
}

#[test]
fn list_dir_null_filter() {
    let mut buf = [0u8; 512];

    let call = ListDir {
        root: 1,
        handle: 2,
        flags: ListFlags::RESTART,
        filter: None,
        buf: PhysMut::new(&mut buf, 0x5_0040),
    };
    let (len, parms) = stage(call, Features::CONTIGUOUS_PAGE_LIST).unwrap();
    let lists_at = align8(parms_end(8));
    assert_eq!(len, lists_at + 2 * 16);
    assert_eq!(
        parms[4],
        Parameter::ContiguousPageList {
            size: 0,
            offset: (lists_at - PREFIX_SIZE) as _,
        }
    );
    assert_eq!(
        parms[5],
        Parameter::ContiguousPageList {
            size: 512,
            offset: (lists_at + 16 - PREFIX_SIZE) as _,
        }
    );
    assert_eq!(parms[3], Parameter::U32(512));
    assert_eq!(parms[6], Parameter::U32(0));
    assert_eq!(parms[7], Parameter::U32(0));

    let call = ListDir {
        root: 1,
        handle: 2,
        flags: ListFlags::empty(),
        filter: None,
        buf: PhysMut::new(&mut buf, 0x5_0040),
    };
    let (len, parms) = stage(call, Features::EMBEDDED_BUFFERS).unwrap();
    assert_eq!(len, parms_end(8));
    assert_eq!(
        parms[4],
        Parameter::Linear {
            dir: Direction::TO_HOST,
            size: 0,
            addr: 0,
        }
    );
    assert_eq!(parms[5].kind(), ParmType::LinAddrOut);
}

#[test]
fn commit_and_collect() {
    let mut buf = [0u8; 8];
    let call = ReadEmbedded {
        root: 1,
        handle: 2,
        offset: 3,
        buf: &mut buf,
    };

    let mut alloc = Alloc::new();
    let staged = StagedCall::stage(call, &mut alloc, Features::EMBEDDED_BUFFERS).unwrap();
    let len = alloc.len();

    let mut block = vec![0xffu8; len + 8];
    let mut com = alloc.commit(&mut block, 0x9000).unwrap();
    let committed = staged.commit(&mut com, &SESSION);
    let block = com.into_inner();
    assert_eq!(block.len(), len);

    let prefix = Prefix::from_bytes(&block[..PREFIX_SIZE]).unwrap();
    assert_eq!(prefix.phys_req, 0x9000 + PREFIX_SIZE as u64);

    let envelope = Envelope::from_bytes(&block[PREFIX_SIZE..PARMS_OFFSET]).unwrap();
    assert_eq!(envelope, Envelope::new((len - PREFIX_SIZE) as _, 42, Function::Read, 5));

    // Host side processing.
    let data = parms_end(5);
    block[data..][..5].copy_from_slice(b"hello");
    let count = PARMS_OFFSET + 3 * PARM_SIZE + 4;
    block[count..][..4].copy_from_slice(&100u32.to_le_bytes());

    assert_eq!(committed.collect(&Collector::new(block)), Ok(8));
    assert_eq!(&buf[..5], b"hello");
}

#[test]
fn host_failure() {
    let mut alloc = Alloc::new();
    let staged = StagedCall::stage(Close { root: 1, handle: 2 }, &mut alloc, Features::empty())
        .unwrap();

    let mut block = vec![0u8; alloc.len()];
    let mut com = alloc.commit(&mut block, 0).unwrap();
    let committed = staged.commit(&mut com, &SESSION);
    let block = com.into_inner();
    block[PREFIX_SIZE + 28..][..4].copy_from_slice(&VERR_FILE_NOT_FOUND.to_le_bytes());

    assert_eq!(
        committed.collect(&Collector::new(block)),
        Err(VERR_FILE_NOT_FOUND)
    );
}

#[test]
fn nil_filter_sentinel() {
    let mut buf = [0u8; 64];
    let call = ListDir {
        root: 1,
        handle: 2,
        flags: ListFlags::empty(),
        filter: None,
        buf: PhysMut::new(&mut buf, 0x6_0000),
    };

    let mut alloc = Alloc::new();
    let staged = StagedCall::stage(call, &mut alloc, Features::CONTIGUOUS_PAGE_LIST).unwrap();
    let mut block = vec![0u8; alloc.len()];
    let mut com = alloc.commit(&mut block, 0).unwrap();
    staged.commit(&mut com, &SESSION);

    let lists_at = align8(parms_end(8));
    assert_eq!(
        &block[lists_at..][..8],
        &[Direction::TO_HOST.bits() as u8, 0, 0, 0, 0, 0, 1, 0]
    );
    assert_eq!(&block[lists_at + 8..][..8], &NIL_PHYS.to_le_bytes());
    assert_eq!(&block[lists_at + 24..][..8], &0x6_0000u64.to_le_bytes());
}

#[test]
fn read_contiguous_single_page() {
    let mut buf = [0u8; 3 * PAGE_SIZE];
    let phys = 0x5_0123;
    let call = ReadContiguous {
        root: 1,
        handle: 2,
        offset: 0,
        buf: PhysMut::new(&mut buf, phys),
    };

    let mut alloc = Alloc::new();
    let staged = StagedCall::stage(call, &mut alloc, Features::CONTIGUOUS_PAGE_LIST).unwrap();
    let list_at = align8(parms_end(5));
    assert_eq!(alloc.len(), list_at + 8 + 8);
    assert_eq!(
        staged.parms()[4],
        Parameter::ContiguousPageList {
            size: 3 * PAGE_SIZE as u32,
            offset: (list_at - PREFIX_SIZE) as _,
        }
    );

    let mut block = vec![0u8; alloc.len()];
    let mut com = alloc.commit(&mut block, 0).unwrap();
    staged.commit(&mut com, &SESSION);

    let header = PageListHeader::from_bytes(&block[list_at..][..8]).unwrap();
    assert_eq!(header.page_count, 1);
    assert_eq!(header.first_page_offset as u64, phys % PAGE_SIZE as u64);
    assert_eq!(header.direction(), Some(Direction::FROM_HOST));
    assert_eq!(&block[list_at + 8..], &0x5_0000u64.to_le_bytes());
}
