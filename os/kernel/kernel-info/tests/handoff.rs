use kernel_info::handoff::*;

fn sample_regions() -> [MemoryRegion; 3] {
    [
        MemoryRegion {
            base: 0,
            length: 0x9_FC00,
            class: MemoryClass::USABLE,
            attributes: 1,
        },
        MemoryRegion {
            base: 0xF_0000,
            length: 0x1_0000,
            class: MemoryClass::RESERVED,
            attributes: 1,
        },
        MemoryRegion {
            base: 0x10_0000,
            length: 0x7EE_0000,
            class: MemoryClass::USABLE,
            attributes: 1,
        },
    ]
}

fn build(buf: &mut [u8]) -> usize {
    let mut w = HandoffWriter::begin(buf).unwrap();
    w.append_entry(&ArchitectureInfo {
        mode: CpuMode::Long,
        flags: ArchFlags::new()
            .with_a20_verified(true)
            .with_pae(true)
            .with_paging(true),
        page_root: 0x1000,
    })
    .unwrap();
    w.append_entry(&FirmwareInfo {
        kind: FirmwareKind::LegacyBios,
        a20: A20Method::Firmware,
    })
    .unwrap();
    w.append_memory_map(&sample_regions()).unwrap();
    w.append_entry(&BootDeviceInfo {
        drive: 0x80,
        start_sector: 65,
        sector_count: 512,
    })
    .unwrap();
    w.append_entry(&ConsoleInfo {
        columns: 80,
        rows: 25,
        buffer: 0xB_8000,
    })
    .unwrap();
    w.finalize()
}

#[test]
fn total_length_counts_header_and_every_entry() {
    let mut buf = [0u8; 512];
    let total = build(&mut buf);

    let payloads = [
        ArchitectureInfo::LEN,
        FirmwareInfo::LEN,
        3 * MemoryRegion::LEN,
        BootDeviceInfo::LEN,
        ConsoleInfo::LEN,
    ];
    let expected = HEADER_LEN + payloads.iter().map(|len| ENTRY_HEADER_LEN + len).sum::<usize>();
    assert_eq!(total, expected);

    assert_eq!(&buf[0..4], b"HDB1");
    assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()) as usize, expected);
    assert_eq!(u16::from_le_bytes([buf[8], buf[9]]), VERSION);
    assert_eq!(u16::from_le_bytes([buf[10], buf[11]]), 5);
}

#[test]
fn parse_yields_appended_entries_in_order() {
    let mut buf = [0u8; 512];
    build(&mut buf);
    let block = HandoffBlock::parse(&buf).unwrap();

    assert_eq!(block.entry_count(), 5);
    let kinds: Vec<_> = block.entries().map(|e| e.entry_type()).collect();
    assert_eq!(
        kinds,
        [
            Some(EntryType::Architecture),
            Some(EntryType::Firmware),
            Some(EntryType::MemoryMap),
            Some(EntryType::BootDevice),
            Some(EntryType::Console),
        ]
    );

    let arch: ArchitectureInfo = block.find().unwrap().unwrap();
    assert_eq!(arch.mode, CpuMode::Long);
    assert!(arch.flags.paging());
    let dev: BootDeviceInfo = block.find().unwrap().unwrap();
    assert_eq!(dev.drive, 0x80);
    let regions: Vec<_> = block.memory_map().unwrap().unwrap().collect();
    assert_eq!(regions, sample_regions());
}

#[test]
fn same_sequence_gives_identical_bytes() {
    let mut a = [0u8; 512];
    let mut b = [0xFFu8; 512];
    let la = build(&mut a);
    let lb = build(&mut b);
    assert_eq!(la, lb);
    assert_eq!(a[..la], b[..lb]);
}

#[test]
fn block_filling_capacity_exactly_is_accepted() {
    let mut buf = [0u8; HEADER_LEN + ENTRY_HEADER_LEN + ConsoleInfo::LEN];
    let mut w = HandoffWriter::begin(&mut buf).unwrap();
    w.append_entry(&ConsoleInfo {
        columns: 80,
        rows: 25,
        buffer: 0xB_8000,
    })
    .unwrap();
    assert_eq!(w.remaining(), 0);
    assert!(matches!(
        w.append(99, &[]),
        Err(HandoffError::Overflow { needed: 8, available: 0 })
    ));
    w.finalize();
    assert!(HandoffBlock::parse(&buf).is_ok());
}

#[test]
fn empty_block_is_valid() {
    let mut buf = [0u8; 12];
    let mut w = HandoffWriter::begin(&mut buf).unwrap();
    assert_eq!(w.finalize(), 12);
    let block = HandoffBlock::parse(&buf).unwrap();
    assert_eq!(block.entries().count(), 0);
    assert!(block.find::<ConsoleInfo>().is_none());
    assert!(block.memory_map().unwrap().is_none());
}

#[test]
fn unknown_entry_types_are_skipped_not_rejected() {
    let mut buf = [0u8; 64];
    let mut w = HandoffWriter::begin(&mut buf).unwrap();
    w.append(0x7F00, &[1, 2, 3]).unwrap();
    w.append_entry(&ConsoleInfo {
        columns: 40,
        rows: 25,
        buffer: 0xB_8000,
    })
    .unwrap();
    w.finalize();
    let block = HandoffBlock::parse(&buf).unwrap();
    assert_eq!(block.entries().next().unwrap().entry_type(), None);
    let console: ConsoleInfo = block.find().unwrap().unwrap();
    assert_eq!(console.columns, 40);
}

#[test]
fn corrupted_headers_are_rejected() {
    let mut buf = [0u8; 512];
    let total = build(&mut buf);

    let mut bad_sig = buf;
    bad_sig[0] = b'X';
    assert!(matches!(
        HandoffBlock::parse(&bad_sig),
        Err(HandoffError::BadSignature(_))
    ));

    let mut bad_version = buf;
    bad_version[8] = 2;
    assert_eq!(
        HandoffBlock::parse(&bad_version).unwrap_err(),
        HandoffError::UnsupportedVersion(2)
    );

    let mut bad_count = buf;
    bad_count[10] = 4;
    assert_eq!(
        HandoffBlock::parse(&bad_count).unwrap_err(),
        HandoffError::CountMismatch {
            declared: 4,
            found: 5
        }
    );

    assert_eq!(
        HandoffBlock::parse(&buf[..total - 1]).unwrap_err(),
        HandoffError::Truncated {
            declared: total,
            available: total - 1
        }
    );

    assert_eq!(
        HandoffBlock::parse(&buf[..8]).unwrap_err(),
        HandoffError::TooShort
    );
}

#[test]
fn entry_length_past_the_end_is_rejected() {
    let mut buf = [0u8; 64];
    let mut w = HandoffWriter::begin(&mut buf).unwrap();
    w.append(5, &[0; 8]).unwrap();
    w.finalize();
    // claim a 200-byte payload
    buf[16] = 200;
    assert_eq!(
        HandoffBlock::parse(&buf).unwrap_err(),
        HandoffError::EntryOutOfBounds { offset: 12 }
    );
}
