//! End-to-end tests for the board lifecycle and the bounded-buffer
//! handshake. Each test uses its own region file and semaphore prefix so
//! the suite can run in parallel.

use std::thread;
use tick_shm::{BoardClient, BoardOwner, FifoEntry, IpcError, IpcResult};

fn board_name(case: &str) -> String {
    format!("tick_test_{}_{}", case, std::process::id())
}

fn sem_prefix(case: &str) -> String {
    format!("/tick_test_{}_{}", case, std::process::id())
}

/// One full producer iteration: wait(available), wait(mutex), dual write,
/// post(mutex), post(filled).
fn producer_step(client: &mut BoardClient, series: u32, value: f64) -> IpcResult<()> {
    client.sems().available.wait()?;
    client.sems().mutex.wait()?;
    let region = client.region_mut();
    region.series[series as usize].record(value);
    region.fifo.push(value, series)?;
    client.sems().mutex.post()?;
    client.sems().filled.post()?;
    Ok(())
}

/// One consumer pop with the filled token already consumed by the caller.
fn locked_pop(owner: &mut BoardOwner) -> IpcResult<FifoEntry> {
    owner.sems().mutex.wait()?;
    let entry = owner.region_mut().fifo.pop()?;
    owner.sems().mutex.post()?;
    owner.sems().available.post()?;
    Ok(entry)
}

#[test]
fn create_attach_teardown() -> IpcResult<()> {
    let name = board_name("lifecycle");
    let prefix = sem_prefix("lifecycle");

    let owner = BoardOwner::create(&name, &prefix, 5)?;
    assert_eq!(owner.region().header.capacity, 5);
    assert_eq!(owner.sems().available.value()?, 5);
    assert_eq!(owner.sems().mutex.value()?, 1);
    assert_eq!(owner.sems().filled.value()?, 0);

    {
        let client = BoardClient::attach(&name, &prefix, 5)?;
        assert_eq!(client.region().header.capacity, 5);
        assert!(client.region().fifo.is_empty());
    } // Client detaches without destroying anything.

    assert!(std::path::Path::new(&format!("/dev/shm/{name}")).exists());

    owner.destroy();
    assert!(!std::path::Path::new(&format!("/dev/shm/{name}")).exists());
    assert!(matches!(
        BoardClient::attach(&name, &prefix, 5),
        Err(IpcError::NotFound { .. })
    ));
    Ok(())
}

#[test]
fn attach_requires_consumer_first() {
    let name = board_name("no_consumer");
    let prefix = sem_prefix("no_consumer");
    assert!(matches!(
        BoardClient::attach(&name, &prefix, 5),
        Err(IpcError::NotFound { .. })
    ));
}

#[test]
fn stale_region_is_cleaned_then_reported() -> IpcResult<()> {
    let name = board_name("stale");
    let prefix = sem_prefix("stale");
    let path = format!("/dev/shm/{name}");

    // A leftover file from a crashed consumer.
    std::fs::write(&path, b"leftover")?;

    let result = BoardOwner::create(&name, &prefix, 5);
    assert!(matches!(result, Err(IpcError::StaleRegion { .. })));
    // The stale file must be gone so the rerun succeeds.
    assert!(!std::path::Path::new(&path).exists());

    let owner = BoardOwner::create(&name, &prefix, 5)?;
    drop(owner);
    Ok(())
}

#[test]
fn capacity_bounds_are_enforced() {
    let name = board_name("bounds");
    let prefix = sem_prefix("bounds");

    assert!(matches!(
        BoardOwner::create(&name, &prefix, 0),
        Err(IpcError::InvalidCapacity { .. })
    ));
    assert!(matches!(
        BoardOwner::create(&name, &prefix, 41),
        Err(IpcError::InvalidCapacity { max: 40, .. })
    ));
}

#[test]
fn producer_capacity_must_match_region() -> IpcResult<()> {
    let name = board_name("mismatch");
    let prefix = sem_prefix("mismatch");

    let _owner = BoardOwner::create(&name, &prefix, 10)?;
    let result = BoardClient::attach(&name, &prefix, 5);
    assert!(matches!(
        result,
        Err(IpcError::CapacityMismatch {
            region: 10,
            requested: 5
        })
    ));
    Ok(())
}

#[test]
fn handshake_moves_one_event() -> IpcResult<()> {
    let name = board_name("handshake");
    let prefix = sem_prefix("handshake");

    let mut owner = BoardOwner::create(&name, &prefix, 3)?;
    let mut client = BoardClient::attach(&name, &prefix, 3)?;

    producer_step(&mut client, 4, 1825.50)?;
    assert_eq!(owner.sems().available.value()?, 2);
    assert_eq!(owner.sems().filled.value()?, 1);

    owner.sems().filled.wait()?;
    let entry = locked_pop(&mut owner)?;
    assert_eq!(entry.value, 1825.50);
    assert_eq!(entry.series, 4);

    // Ring and FIFO were written as one unit under the same mutex hold.
    assert_eq!(owner.region().series[4].latest(), 1825.50);

    assert_eq!(owner.sems().available.value()?, 3);
    assert_eq!(owner.sems().filled.value()?, 0);
    assert_eq!(owner.sems().mutex.value()?, 1);
    Ok(())
}

#[test]
fn full_fifo_blocks_third_write() -> IpcResult<()> {
    let name = board_name("backpressure");
    let prefix = sem_prefix("backpressure");

    let mut owner = BoardOwner::create(&name, &prefix, 2)?;

    let producer = {
        let name = name.clone();
        let prefix = prefix.clone();
        thread::spawn(move || -> IpcResult<()> {
            let mut client = BoardClient::attach(&name, &prefix, 2)?;
            for value in [10.0, 20.0, 30.0] {
                producer_step(&mut client, 0, value)?;
            }
            Ok(())
        })
    };

    // Consume the first two filled tokens: both writes have completed and
    // the third is blocked on `available`, holding no other resource.
    owner.sems().filled.wait()?;
    owner.sems().filled.wait()?;

    owner.sems().mutex.wait()?;
    assert_eq!(owner.region().fifo.len(), 2);
    owner.sems().mutex.post()?;
    assert_eq!(owner.sems().available.value()?, 0);

    // One pop frees a slot and unblocks the producer.
    let first = locked_pop(&mut owner)?;
    assert_eq!(first.value, 10.0);

    owner.sems().filled.wait()?;
    owner.sems().mutex.wait()?;
    // The queue is back at capacity after the unblocked write.
    assert_eq!(owner.region().fifo.len(), 2);
    owner.sems().mutex.post()?;

    assert_eq!(locked_pop(&mut owner)?.value, 20.0);
    assert_eq!(locked_pop(&mut owner)?.value, 30.0);
    assert!(owner.region().fifo.is_empty());

    producer.join().expect("producer thread panicked")?;

    assert_eq!(owner.sems().available.value()?, 2);
    assert_eq!(owner.sems().filled.value()?, 0);
    assert_eq!(owner.sems().mutex.value()?, 1);
    Ok(())
}

#[test]
fn concurrent_producers_drain_exactly() -> IpcResult<()> {
    const PRODUCERS: u32 = 3;
    const WRITES: u32 = 20;
    const CAPACITY: u32 = 4;

    let name = board_name("concurrent");
    let prefix = sem_prefix("concurrent");

    let mut owner = BoardOwner::create(&name, &prefix, CAPACITY)?;

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|series| {
            let name = name.clone();
            let prefix = prefix.clone();
            thread::spawn(move || -> IpcResult<()> {
                let mut client = BoardClient::attach(&name, &prefix, CAPACITY)?;
                for i in 0..WRITES {
                    producer_step(&mut client, series, (series * 1000 + i) as f64)?;
                }
                Ok(())
            })
        })
        .collect();

    let mut popped: Vec<Vec<f64>> = vec![Vec::new(); PRODUCERS as usize];
    for _ in 0..PRODUCERS * WRITES {
        owner.sems().filled.wait()?;
        let entry = locked_pop(&mut owner)?;
        popped[entry.series as usize].push(entry.value);

        // available + filled never exceeds the capacity.
        let available = owner.sems().available.value()?;
        let filled = owner.sems().filled.value()?;
        assert!(available + filled <= CAPACITY as i32);
    }

    for handle in handles {
        handle.join().expect("producer thread panicked")?;
    }

    // Exactly N*M entries, in per-producer FIFO order.
    for (series, values) in popped.iter().enumerate() {
        assert_eq!(values.len(), WRITES as usize);
        for (i, value) in values.iter().enumerate() {
            assert_eq!(*value, (series * 1000 + i) as f64);
        }
    }

    // Not a single extra entry remains.
    assert!(owner.region().fifo.is_empty());
    assert!(!owner.sems().filled.wait_timeout(std::time::Duration::from_millis(20))?);
    assert_eq!(owner.sems().available.value()?, CAPACITY as i32);
    assert_eq!(owner.sems().mutex.value()?, 1);
    Ok(())
}
