use boot_stage2::firmware::MemoryMapStep;
use boot_stage2::{
    BootError, CpuControl, DiskError, DiskRead, Engine, Firmware, FirmwareError, ModeSwitch,
    PhysicalMemory, Stage, Stage2Config, TargetMode,
};
use kernel_hal::DescriptorTablePointer;
use kernel_hal::testing::ScriptedPorts;
use kernel_info::handoff::{
    A20Method, ArchitectureInfo, BootDeviceInfo, ConsoleInfo, CpuMode, FirmwareInfo,
    HandoffBlock, MemoryClass, MemoryRegion,
};
use kernel_memory_addresses::{PhysicalAddress, SegmentedAddress};
use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

const BOOT_DRIVE: u8 = 0x80;
const KBC_STATUS: u16 = 0x64;
const KBC_DATA: u16 = 0x60;

struct MockFirmware {
    reads: Vec<DiskRead>,
    fail_read: Option<usize>,
    a20_ok: bool,
    a20_calls: usize,
    map: Vec<MemoryRegion>,
    screen: Rc<RefCell<Vec<u8>>>,
}

impl MockFirmware {
    fn new() -> Self {
        Self {
            reads: Vec::new(),
            fail_read: None,
            a20_ok: true,
            a20_calls: 0,
            map: vec![
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
            ],
            screen: Rc::default(),
        }
    }
}

impl Firmware for MockFirmware {
    fn read_sectors(&mut self, request: &DiskRead) -> Result<(), DiskError> {
        if self.fail_read == Some(self.reads.len()) {
            return Err(DiskError::Firmware(0x40));
        }
        self.reads.push(*request);
        Ok(())
    }

    fn print_byte(&mut self, byte: u8) {
        self.screen.borrow_mut().push(byte);
    }

    fn memory_map_entry(&mut self, continuation: u32) -> Option<MemoryMapStep> {
        let index = usize::try_from(continuation).ok()?;
        let region = *self.map.get(index)?;
        let next = if index + 1 < self.map.len() { continuation + 1 } else { 0 };
        Some(MemoryMapStep {
            region,
            continuation: next,
        })
    }

    fn enable_a20(&mut self) -> Result<(), FirmwareError> {
        self.a20_calls += 1;
        if self.a20_ok {
            Ok(())
        } else {
            Err(FirmwareError { status: 0x86 })
        }
    }
}

struct MockMachine {
    memory: Vec<u8>,
    cs: u16,
    table_offset: u16,
    wraps: bool,
    loaded_tables: Vec<DescriptorTablePointer>,
}

impl MockMachine {
    fn new() -> Self {
        Self {
            memory: vec![0xCC; 0x1_0000],
            cs: 0,
            table_offset: 0x7F40,
            wraps: false,
            loaded_tables: Vec::new(),
        }
    }

    fn bytes(&self, base: u64, len: usize) -> &[u8] {
        let base = usize::try_from(base).unwrap();
        &self.memory[base..base + len]
    }
}

impl CpuControl for MockMachine {
    fn code_segment(&self) -> u16 {
        self.cs
    }

    fn descriptor_table_offset(&self) -> u16 {
        self.table_offset
    }

    fn address_wraps(&mut self) -> bool {
        self.wraps
    }

    fn load_descriptor_table(&mut self, pointer: &DescriptorTablePointer) {
        self.loaded_tables.push(*pointer);
    }

    fn switch_and_enter(&mut self, plan: &ModeSwitch) -> ! {
        panic!("switch to {:?} mode, entry {}", plan.target, plan.entry);
    }

    fn halt(&mut self) -> ! {
        panic!("halted");
    }
}

impl PhysicalMemory for MockMachine {
    fn region(&mut self, base: PhysicalAddress, len: usize) -> &mut [u8] {
        let base = usize::try_from(base.as_u64()).unwrap();
        &mut self.memory[base..base + len]
    }
}

type TestEngine = Engine<MockFirmware, ScriptedPorts, MockMachine>;

fn ports() -> ScriptedPorts {
    let mut ports = ScriptedPorts::new();
    // input buffer empty, output buffer full
    ports.fallback(KBC_STATUS, 0x01);
    ports.fallback(KBC_DATA, 0x01);
    ports
}

fn engine(target: TargetMode) -> TestEngine {
    engine_with(target, MockFirmware::new(), MockMachine::new())
}

fn engine_with(target: TargetMode, firmware: MockFirmware, machine: MockMachine) -> TestEngine {
    Engine::new(
        Stage2Config::DEFAULT.with_target(target),
        BOOT_DRIVE,
        firmware,
        ports(),
        machine,
    )
}

fn walk(engine: &mut TestEngine) -> Vec<Stage> {
    let mut stages = Vec::new();
    while engine.stage() < Stage::HandoffBlockFinalized {
        stages.push(engine.step().unwrap());
    }
    stages
}

fn handoff(engine: &TestEngine) -> HandoffBlock<'_> {
    let config = engine.config();
    HandoffBlock::parse(
        engine
            .machine()
            .bytes(config.handoff.as_u64(), config.handoff_capacity),
    )
    .unwrap()
}

#[test]
fn long_mode_visits_every_stage_in_order() {
    let mut engine = engine(TargetMode::Long);
    assert_eq!(engine.stage(), Stage::Entered);
    assert_eq!(
        walk(&mut engine),
        [
            Stage::ExtendedAddressingEnabled,
            Stage::KernelImageLoaded,
            Stage::DescriptorTablesBuilt,
            Stage::PageTablesBuilt,
            Stage::HandoffBlockFinalized,
        ]
    );
    // nothing left to prepare
    assert_eq!(engine.step().unwrap(), Stage::HandoffBlockFinalized);
    assert_eq!(engine.firmware().reads.len(), 8);
}

#[test]
fn protected_mode_skips_page_tables() {
    let mut engine = engine(TargetMode::Protected);
    let stages = walk(&mut engine);
    assert!(!stages.contains(&Stage::PageTablesBuilt));
    assert_eq!(stages.len(), 4);

    let tables = engine.machine().bytes(0x1000, 3 * 4096);
    assert!(tables.iter().all(|&b| b == 0xCC));

    let arch = handoff(&engine).find::<ArchitectureInfo>().unwrap().unwrap();
    assert_eq!(arch.mode, CpuMode::Protected);
    assert!(!arch.flags.paging());
    assert_eq!(arch.page_root, 0);

    let gdt = engine.context().descriptor_table.unwrap();
    assert_eq!({ gdt.limit }, 3 * 8 - 1);
}

#[test]
fn kernel_is_read_in_chunks_of_64() {
    let mut engine = engine(TargetMode::Long);
    engine.prepare().unwrap();

    let reads = &engine.firmware().reads;
    assert!(reads.iter().all(|r| r.sectors <= 64 && r.drive == BOOT_DRIVE));
    assert_eq!(reads.iter().map(|r| u32::from(r.sectors)).sum::<u32>(), 512);
    for (i, read) in reads.iter().enumerate() {
        let i = u16::try_from(i).unwrap();
        assert_eq!(read.lba, 65 + u64::from(i) * 64);
        assert_eq!(read.buffer, SegmentedAddress::new(0x1000 + i * 0x800, 0));
    }
}

#[test]
fn disk_failure_stops_the_engine() {
    let mut firmware = MockFirmware::new();
    firmware.fail_read = Some(2);
    let mut engine = engine_with(TargetMode::Long, firmware, MockMachine::new());

    assert_eq!(engine.step().unwrap(), Stage::ExtendedAddressingEnabled);
    assert_eq!(
        engine.step(),
        Err(BootError::Disk {
            lba: 65 + 128,
            sectors: 64,
            source: DiskError::Firmware(0x40),
        })
    );
    assert_eq!(engine.stage(), Stage::ExtendedAddressingEnabled);
    assert_eq!(engine.firmware().reads.len(), 2);
    assert!(engine.context().kernel.is_none());
}

#[test]
fn failure_is_reported_on_screen_before_halting() {
    let mut firmware = MockFirmware::new();
    firmware.fail_read = Some(0);
    let screen = Rc::clone(&firmware.screen);
    let mut engine = engine_with(TargetMode::Long, firmware, MockMachine::new());

    let err = engine.prepare().unwrap_err();
    let halted = catch_unwind(AssertUnwindSafe(move || engine.fail(&err)));
    assert!(halted.is_err());

    let text = String::from_utf8(screen.borrow().clone()).unwrap();
    assert!(text.starts_with("Stage-2: disk read of 64 sectors at LBA 65 failed"));
    assert!(text.ends_with("\r\n"));
}

#[test]
fn firmware_a20_skips_keyboard_controller() {
    let mut engine = engine(TargetMode::Long);
    engine.step().unwrap();

    assert!(engine.ports().writes().is_empty());
    let a20 = engine.context().a20.unwrap();
    assert_eq!(a20.method, A20Method::Firmware);
    assert!(a20.verified);
}

#[test]
fn keyboard_controller_fallback_on_firmware_failure() {
    let mut firmware = MockFirmware::new();
    firmware.a20_ok = false;
    let mut engine = engine_with(TargetMode::Long, firmware, MockMachine::new());
    engine.step().unwrap();

    assert_eq!(engine.firmware().a20_calls, 1);
    assert_eq!(
        engine.ports().writes(),
        [
            (KBC_STATUS, 0xAD),
            (KBC_STATUS, 0xD0),
            (KBC_STATUS, 0xD1),
            (KBC_DATA, 0x03),
            (KBC_STATUS, 0xAE),
        ]
    );
    assert_eq!(
        engine.context().a20.unwrap().method,
        A20Method::KeyboardController
    );
}

#[test]
fn unverified_a20_is_recorded_not_fatal() {
    let mut machine = MockMachine::new();
    machine.wraps = true;
    let mut engine = engine_with(TargetMode::Long, MockFirmware::new(), machine);
    engine.prepare().unwrap();

    let arch = handoff(&engine).find::<ArchitectureInfo>().unwrap().unwrap();
    assert!(!arch.flags.a20_verified());
    assert!(arch.flags.paging());
}

#[test]
fn descriptor_table_is_relocated_from_code_segment() {
    let mut machine = MockMachine::new();
    machine.cs = 0x07E0;
    machine.table_offset = 0x0140;
    let mut engine = engine_with(TargetMode::Long, MockFirmware::new(), machine);
    engine.prepare().unwrap();

    let loaded = engine.machine().loaded_tables.clone();
    assert_eq!(loaded.len(), 1);
    let (base, limit) = (loaded[0].base, loaded[0].limit);
    assert_eq!(base, 0x7F40);
    assert_eq!(limit, 39);

    let table = engine.machine().bytes(0x7F40, 40);
    assert_eq!(&table[..8], &[0; 8]);
    assert_eq!(&table[24..32], &0x00AF_9A00_0000_FFFFu64.to_le_bytes());
}

#[test]
fn identical_inputs_give_identical_memory() {
    let mut a = engine(TargetMode::Long);
    let mut b = engine(TargetMode::Long);
    let plan_a = a.prepare().unwrap();
    let plan_b = b.prepare().unwrap();
    assert_eq!(plan_a, plan_b);
    assert_eq!(a.machine().memory, b.machine().memory);
}

#[test]
fn handoff_block_describes_the_machine() {
    let mut engine = engine(TargetMode::Long);
    engine.prepare().unwrap();
    let block = handoff(&engine);

    assert_eq!(block.entry_count(), 5);
    assert_eq!(Some(block.total_length()), engine.context().handoff_len);

    let arch = block.find::<ArchitectureInfo>().unwrap().unwrap();
    assert_eq!(arch.mode, CpuMode::Long);
    assert!(arch.flags.a20_verified() && arch.flags.pae() && arch.flags.paging());
    assert_eq!(arch.page_root, 0x1000);

    let firmware = block.find::<FirmwareInfo>().unwrap().unwrap();
    assert_eq!(firmware.a20, A20Method::Firmware);

    let device = block.find::<BootDeviceInfo>().unwrap().unwrap();
    assert_eq!(
        device,
        BootDeviceInfo {
            drive: BOOT_DRIVE,
            start_sector: 65,
            sector_count: 512,
        }
    );

    let console = block.find::<ConsoleInfo>().unwrap().unwrap();
    assert_eq!((console.columns, console.rows, console.buffer), (80, 25, 0xB_8000));

    let regions: Vec<_> = block.memory_map().unwrap().unwrap().collect();
    assert_eq!(regions, engine.firmware().map);
}

#[test]
fn identity_map_is_installed_for_long_mode() {
    let mut engine = engine(TargetMode::Long);
    engine.prepare().unwrap();

    let pd = engine.machine().bytes(0x3000, 4 * 8);
    for (i, entry) in pd.chunks_exact(8).enumerate() {
        let raw = u64::from_le_bytes(entry.try_into().unwrap());
        assert_eq!(raw, ((i as u64) << 21) | 0x83);
    }
    assert_eq!(engine.machine().bytes(0x3000 + 4 * 8, 8), &[0; 8]);
}

#[test]
fn plan_targets_kernel_with_handoff() {
    let mut engine = engine(TargetMode::Long);
    let plan = engine.prepare().unwrap();

    assert_eq!(plan.entry.as_u64(), 0x1_0000);
    assert_eq!(plan.handoff.as_u64(), 0x4000);
    assert_eq!(plan.stack_top.as_u64(), 0x9_F000);
    let long = plan.long_mode.unwrap();
    assert_eq!(long.cr3.pml4().as_u64(), 0x1000);
    assert!(long.cr4.pae() && long.efer.lme() && long.cr0.pg() && long.cr0.pe());
    assert_eq!((long.code_selector, long.data_selector), (0x18, 0x20));
}

#[test]
fn plan_before_handoff_is_out_of_order() {
    let mut engine = engine(TargetMode::Long);
    engine.step().unwrap();
    assert!(matches!(engine.plan(), Err(BootError::OutOfOrder { .. })));
}

#[test]
#[should_panic(expected = "switch to Long mode, entry 0x00010000")]
fn enter_kernel_hands_the_plan_to_the_trampoline() {
    let mut engine = engine(TargetMode::Long);
    let plan = engine.prepare().unwrap();
    engine.enter_kernel(&plan);
}
