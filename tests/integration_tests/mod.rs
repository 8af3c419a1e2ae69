// SPDX-License-Identifier: Apache-2.0

use super::TestHandler;

use sfport::guest::{Features, Handler, PageList, PhysBuf};
use sfport::item::shfl::{
    string_len, CreateFlags, CreateParms, CreateResult, DirEntries, ListFlags, ObjInfo,
    RemoveFlags, RenameFlags, ShflStr, VolInfo,
};
use sfport::item::{ByteSized, PARMS_OFFSET, PARM_SIZE};
use sfport::status::{
    VERR_FILE_NOT_FOUND, VERR_INVALID_PARAMETER, VERR_NOT_IMPLEMENTED, VERR_NO_MEMORY,
    VERR_OUT_OF_RANGE,
};
use sfport::PAGE_SIZE;

const TRANSFER_PARMS_END: usize = PARMS_OFFSET + 5 * PARM_SIZE;

const ALL: [Features; 4] = [
    Features::empty(),
    Features::EMBEDDED_BUFFERS,
    Features::CONTIGUOUS_PAGE_LIST,
    Features::all(),
];

#[test]
fn map_folder() {
    for features in ALL {
        let handler = TestHandler::new(features);
        {
            let name = PhysBuf::string(&handler.heap, b"share").unwrap();
            assert_eq!(handler.map_folder(name.phys(), b'/' as u16, false), Ok(3));
        }
        assert_eq!(handler.unmap_folder(3), Ok(()));
        assert_eq!(handler.host.borrow().names, [b"share".to_vec()]);
        assert_eq!(handler.calls.get(), 2);
        assert_eq!(handler.heap.live(), 0);
    }
}

#[test]
fn create() {
    for features in ALL {
        let handler = TestHandler::new(features);
        handler.host.borrow_mut().info.size = 42;

        let mut raw = [0u8; string_len(8)];
        let path = ShflStr::encode(&mut raw, b"dir/file").unwrap();
        let mut parms = CreateParms::new(CreateFlags::empty());
        assert_eq!(handler.create(3, path, &mut parms), Ok(()));

        assert_eq!(parms.handle, 0x1234);
        assert_eq!(parms.create_result(), Ok(CreateResult::FileCreated));
        assert_eq!(parms.info.size, 42);
        assert_eq!(handler.host.borrow().names, [b"dir/file".to_vec()]);
        assert_eq!(handler.heap.live(), 0);
    }
}

#[test]
fn embedded_transfers() {
    for features in ALL {
        let handler = TestHandler::new(features);
        assert_eq!(handler.write_embedded(3, 1, 0, b"hello world"), Ok(11));

        let mut buf = [0u8; 16];
        assert_eq!(handler.read_embedded(3, 1, 6, &mut buf), Ok(5));
        assert_eq!(&buf[..5], b"world");

        // Embedded data directly follows the parameters.
        let lengths = handler.lengths.borrow();
        if features.contains(Features::EMBEDDED_BUFFERS) {
            assert_eq!(lengths[..], [TRANSFER_PARMS_END + 11, TRANSFER_PARMS_END + 16]);
        } else {
            assert_eq!(lengths[..], [TRANSFER_PARMS_END; 2]);
        }
        assert_eq!(handler.heap.live(), 0);
    }
}

#[test]
fn contiguous_transfers() {
    for features in ALL {
        let handler = TestHandler::new(features);
        {
            let data = PhysBuf::from_bytes(&handler.heap, &[0xa5; 3000]).unwrap();
            assert_eq!(handler.write_contiguous(3, 1, 100, data.phys()), Ok(3000));

            let mut buf = PhysBuf::new(&handler.heap, 2 * PAGE_SIZE).unwrap();
            assert_eq!(handler.read_contiguous(3, 1, 0, buf.phys_mut()), Ok(3100));
            assert!(buf.as_slice()[..100].iter().all(|b| *b == 0));
            assert!(buf.as_slice()[100..3100].iter().all(|b| *b == 0xa5));
        }
        assert_eq!(handler.heap.live(), 0);
    }
}

#[test]
fn page_list_transfers() {
    let handler = TestHandler::new(Features::all());
    {
        // Misalign the buffer so that it straddles two pages.
        let _pad = PhysBuf::new(&handler.heap, 40).unwrap();
        let mut buf = PhysBuf::new(&handler.heap, PAGE_SIZE + 100).unwrap();
        for (i, b) in buf.as_mut_slice().iter_mut().enumerate() {
            *b = i as u8;
        }
        let expected = buf.as_slice().to_vec();

        let mut pages = [0u64; 4];
        let list = PageList::for_buffer(&buf, &mut pages).unwrap();
        assert_eq!(list.first_page_offset(), 40);
        assert_eq!(list.pages().len(), 2);
        let len = expected.len() as u32;
        assert_eq!(handler.write_page_list(3, 1, 0, len, list), Ok(len));
        assert_eq!(handler.host.borrow().file, expected);

        buf.as_mut_slice().fill(0);
        let mut pages = [0u64; 4];
        let list = PageList::for_buffer(&buf, &mut pages).unwrap();
        assert_eq!(handler.read_page_list(3, 1, 0, len, list), Ok(len));
        assert_eq!(buf.as_slice(), &expected[..]);

        assert_eq!(
            handler.read_page_list(3, 1, 0, len + PAGE_SIZE as u32, list),
            Err(VERR_INVALID_PARAMETER)
        );
    }
    assert_eq!(handler.calls.get(), 2);
    assert_eq!(handler.heap.live(), 0);
}

#[test]
fn page_list_limit() {
    let handler = TestHandler::with_heap(Features::all(), 160);
    let target = PhysBuf::new(&handler.heap, PAGE_SIZE).unwrap();
    let page = target.phys_range().unwrap().page;

    let pages = vec![page; 65536];
    let list = PageList::new(0, &pages).unwrap();
    assert_eq!(
        handler.write_page_list(3, 1, 0, 10, list),
        Err(VERR_OUT_OF_RANGE)
    );
    assert_eq!(handler.calls.get(), 0);
    assert_eq!(handler.heap.live(), 1);

    let list = PageList::new(0, &pages[1..]).unwrap();
    assert_eq!(handler.write_page_list(3, 1, 0, 10, list), Ok(10));
    assert_eq!(handler.calls.get(), 1);
    assert_eq!(handler.host.borrow().file, [0; 10]);
}

#[test]
fn information() {
    for features in ALL {
        let handler = TestHandler::new(features);

        let mut vol = VolInfo::default();
        assert_eq!(handler.query_vol_info(3, 1, &mut vol), Ok(()));
        assert_eq!(vol.total_bytes, 1 << 30);

        let mut info = ObjInfo {
            size: 77,
            ..Default::default()
        };
        assert_eq!(handler.set_obj_info(3, 1, &mut info), Ok(()));
        assert_eq!(info.change_time, 1);

        let mut queried = ObjInfo::default();
        assert_eq!(handler.query_obj_info(3, 1, &mut queried), Ok(()));
        assert_eq!(queried, info);

        {
            let mut buf = PhysBuf::new(&handler.heap, 200).unwrap();
            buf.as_mut_slice()[16..][..96].copy_from_slice(queried.as_bytes());
            let updated = handler.set_obj_info_with_buf(3, 1, buf.phys_mut(), 16).unwrap();
            assert_eq!(updated.size, 77);
            assert_eq!(updated.change_time, 2);

            assert_eq!(
                handler.set_obj_info_with_buf(3, 1, buf.phys_mut(), 105),
                Err(VERR_INVALID_PARAMETER)
            );
        }
        assert_eq!(handler.calls.get(), 4);
        assert_eq!(handler.heap.live(), 0);
    }
}

#[test]
fn paths() {
    for features in ALL {
        let handler = TestHandler::new(features);
        {
            let mut raw = [0u8; string_len(3)];
            let path = ShflStr::encode(&mut raw, b"old").unwrap();
            assert_eq!(handler.remove(3, path, RemoveFlags::FILE), Ok(()));

            let src = PhysBuf::string(&handler.heap, b"old").unwrap();
            let mut raw = [0u8; string_len(3)];
            let dst = ShflStr::encode(&mut raw, b"new").unwrap();
            let flags = RenameFlags::FILE | RenameFlags::REPLACE_IF_EXISTS;
            assert_eq!(handler.rename_with_src_buf(3, src.phys(), dst, flags), Ok(()));
        }
        let host = handler.host.borrow();
        assert_eq!(host.names[..], [b"old".to_vec(), b"old".to_vec(), b"new".to_vec()]);
        assert_eq!(handler.heap.live(), 0);
    }
}

#[test]
fn list_dir() {
    for features in ALL {
        for filter in [None, Some(&b"*.txt"[..])] {
            let handler = TestHandler::new(features);
            {
                let filter = filter.map(|f| PhysBuf::string(&handler.heap, f).unwrap());
                let mut buf = PhysBuf::new(&handler.heap, 512).unwrap();
                let filter = filter.as_ref().map(|f| f.phys());
                let result = handler
                    .list_dir(3, 1, filter, ListFlags::empty(), buf.phys_mut())
                    .unwrap();
                assert_eq!(result.entries, 1);
                assert!(result.done);

                let listed = &buf.as_slice()[..result.bytes as usize];
                let mut entries = DirEntries::new(listed, result.entries);
                assert_eq!(entries.next().unwrap().name.string(), b"file");
                assert_eq!(entries.next(), None);
            }
            let expected: Vec<Vec<u8>> = filter.iter().map(|f| f.to_vec()).collect();
            assert_eq!(handler.host.borrow().names, expected);
            assert_eq!(handler.heap.live(), 0);
        }
    }
}

#[test]
fn scalar_calls() {
    let handler = TestHandler::new(Features::empty());
    assert_eq!(handler.write_embedded(3, 1, 0, b"abc"), Ok(3));
    assert_eq!(handler.set_file_size(3, 1, 10), Ok(()));
    assert_eq!(handler.host.borrow().file, b"abc\0\0\0\0\0\0\0");
    assert_eq!(handler.flush(3, 1), Ok(()));
    assert_eq!(handler.close(3, 1), Ok(()));
    assert_eq!(handler.calls.get(), 4);
}

#[test]
fn host_failure() {
    let handler = TestHandler::new(Features::all());
    handler.host.borrow_mut().result = Some(VERR_FILE_NOT_FOUND);

    let mut raw = [0u8; string_len(4)];
    let path = ShflStr::encode(&mut raw, b"gone").unwrap();
    assert_eq!(handler.remove(3, path, RemoveFlags::FILE), Err(VERR_FILE_NOT_FOUND));

    let mut buf = [0u8; 8];
    assert_eq!(handler.read_embedded(3, 1, 0, &mut buf), Err(VERR_FILE_NOT_FOUND));
    assert_eq!(handler.heap.live(), 0);
}

#[test]
fn out_of_memory() {
    let handler = TestHandler::new(Features::all());
    let name = PhysBuf::string(&handler.heap, b"share").unwrap();
    let mut buf = PhysBuf::new(&handler.heap, PAGE_SIZE).unwrap();
    let mut pages = [0u64; 2];
    let list = PageList::for_buffer(&buf, &mut pages).unwrap();
    let live = handler.heap.live();
    handler.heap.exhaust();

    let mut raw = [0u8; string_len(4)];
    let path = ShflStr::encode(&mut raw, b"file").unwrap();
    let mut parms = CreateParms::default();
    let mut info = ObjInfo::default();
    let mut vol = VolInfo::default();
    let mut data = [0u8; 16];

    let results = [
        handler.map_folder(name.phys(), b'/' as u16, true).map(drop),
        handler.unmap_folder(3),
        handler.create(3, path, &mut parms),
        handler.close(3, 1),
        handler.query_vol_info(3, 1, &mut vol),
        handler.query_obj_info(3, 1, &mut info),
        handler.set_obj_info(3, 1, &mut info),
        handler.remove(3, path, RemoveFlags::FILE),
        handler.rename_with_src_buf(3, name.phys(), path, RenameFlags::FILE),
        handler.flush(3, 1),
        handler.set_file_size(3, 1, 0),
        handler.read_embedded(3, 1, 0, &mut data).map(drop),
        handler.read_page_list(3, 1, 0, 16, list).map(drop),
        handler.write_embedded(3, 1, 0, &data).map(drop),
        handler.write_page_list(3, 1, 0, 16, list).map(drop),
        handler.write_contiguous(3, 1, 0, name.phys()).map(drop),
        handler.read_contiguous(3, 1, 0, buf.phys_mut()).map(drop),
        handler.set_obj_info_with_buf(3, 1, buf.phys_mut(), 0).map(drop),
        handler.list_dir(3, 1, None, ListFlags::empty(), buf.phys_mut()).map(drop),
    ];
    assert!(results.iter().all(|rc| *rc == Err(VERR_NO_MEMORY)));
    assert_eq!(handler.calls.get(), 0);
    assert_eq!(handler.heap.live(), live);
}

#[test]
fn not_implemented() {
    let handler = TestHandler::new(Features::all());
    let mut raw = [0u8; string_len(4)];
    let path = ShflStr::encode(&mut raw, b"file").unwrap();
    assert_eq!(handler.set_path_mode(3, path, 0o755), Err(VERR_NOT_IMPLEMENTED));
    assert_eq!(handler.set_path_owner(3, path, 1000, 1000), Err(VERR_NOT_IMPLEMENTED));
    assert_eq!(handler.set_path_times(3, path, 1, 2), Err(VERR_NOT_IMPLEMENTED));
    assert_eq!(handler.calls.get(), 0);
}
