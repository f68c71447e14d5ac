use kernel_sync::SyncOnceCell;

#[test]
fn get_before_init_is_none() {
    let cell: SyncOnceCell<u32> = SyncOnceCell::new();
    assert!(cell.get().is_none());
}

#[test]
fn set_only_succeeds_once() {
    let cell = SyncOnceCell::new();
    assert_eq!(cell.set(7u32), Ok(()));
    assert_eq!(cell.set(8u32), Err(8));
    assert_eq!(cell.get(), Some(&7));
}

#[test]
fn get_or_init_runs_initializer_once() {
    let cell = SyncOnceCell::new();
    let mut calls = 0;
    let first = cell.get_or_init(|| {
        calls += 1;
        String::from("idt")
    });
    assert_eq!(first, "idt");

    let second = cell.get_or_init(|| unreachable!("already initialized"));
    assert_eq!(second, "idt");
    assert_eq!(calls, 1);
}

#[test]
fn drops_the_stored_value() {
    use std::rc::Rc;
    let marker = Rc::new(());
    {
        let cell = SyncOnceCell::new();
        cell.set(Rc::clone(&marker)).unwrap();
        assert_eq!(Rc::strong_count(&marker), 2);
    }
    assert_eq!(Rc::strong_count(&marker), 1);
}
