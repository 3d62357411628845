use kernel_sync::{Clock, SpinMutex, TicketMutex, Ticks};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::{panic, thread};

#[test]
fn basic_lock_and_raii() {
    let l = SpinMutex::new(0_u32);

    // take the lock, mutate, and drop
    {
        let mut g = l.lock();
        *g = 41;
        assert!(l.is_locked());
    }
    assert!(!l.is_locked());

    // lock again; previous drop must have unlocked
    {
        let mut g = l.lock();
        *g += 1;
        assert_eq!(*g, 42);
    }
}

#[test]
fn try_lock_semantics() {
    let l = TicketMutex::new(1u8);

    let g1 = l.try_lock();
    assert!(g1.is_some());
    assert_eq!(**g1.as_ref().unwrap(), 1);

    // while held, try_lock must fail
    assert!(l.try_lock().is_none());

    drop(g1);
    assert!(l.try_lock().is_some());
}

#[test]
fn get_mut_allows_direct_mutation() {
    let mut l = SpinMutex::new(vec![1, 2, 3]);
    l.get_mut().push(4);
    assert_eq!(l.lock().as_slice(), &[1, 2, 3, 4]);
}

fn hammer<L, F>(lock: Arc<L>, with: F)
where
    L: Send + Sync + 'static,
    F: Fn(&L, &mut dyn FnMut(&mut usize)) + Send + Sync + Copy + 'static,
{
    let threads = 8;
    let iters = 5_000;

    let in_cs = Arc::new(AtomicUsize::new(0));
    let start = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let lock = Arc::clone(&lock);
            let in_cs = Arc::clone(&in_cs);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for _ in 0..iters {
                    with(&*lock, &mut |v| {
                        let prev = in_cs.fetch_add(1, Ordering::SeqCst);
                        assert_eq!(prev, 0, "mutual exclusion violated");
                        *v += 1;
                        in_cs.fetch_sub(1, Ordering::SeqCst);
                    });
                    thread::yield_now();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let mut total = 0;
    with(&*lock, &mut |v| total = *v);
    assert_eq!(total, threads * iters);
}

#[test]
fn spin_mutex_contended_increments_are_exact() {
    hammer(Arc::new(SpinMutex::new(0usize)), |l, f| l.with_lock(|v| f(v)));
}

#[test]
fn ticket_mutex_contended_increments_are_exact() {
    hammer(Arc::new(TicketMutex::new(0usize)), |l, f| l.with_lock(|v| f(v)));
}

#[test]
fn lock_is_released_on_panic() {
    let l = SpinMutex::new(0u32);

    let res = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        l.with_lock(|v| {
            *v = 123;
            panic!("boom");
        });
    }));
    assert!(res.is_err(), "expected panic");

    let val = l.with_lock(|v| *v);
    assert_eq!(val, 123);
}

#[test]
fn ticks_advance_monotonically() {
    let ticks = Ticks::new();
    assert_eq!(ticks.now(), 0);
    assert_eq!(ticks.tick(), 1);
    assert_eq!(ticks.tick(), 2);
    assert_eq!((&ticks).now(), 2);
}

#[test]
fn tick_lands_while_a_reader_is_inside_a_critical_section() {
    // the timer handler runs on top of the interrupted reader, on the same thread
    let ticks = Ticks::new();
    let bucket = SpinMutex::new(());
    let held = bucket.lock();
    let before = ticks.now();
    let timer_handler = || ticks.tick();
    assert_eq!(timer_handler(), before + 1);
    assert_eq!(ticks.now(), before + 1);
    drop(held);
}

#[test]
fn concurrent_ticks_and_reads_make_progress() {
    const TICKS: u64 = 100_000;
    let ticks = Arc::new(Ticks::new());
    let start = Arc::new(Barrier::new(2));

    let timer = {
        let ticks = Arc::clone(&ticks);
        let start = Arc::clone(&start);
        thread::spawn(move || {
            start.wait();
            for _ in 0..TICKS {
                ticks.tick();
            }
        })
    };

    start.wait();
    let mut last = 0;
    while last < TICKS {
        let now = ticks.now();
        assert!(now >= last, "clock went backwards: {now} < {last}");
        last = now;
    }
    timer.join().unwrap();
    assert_eq!(ticks.now(), TICKS);
}

#[test]
fn mutexes_are_sync_for_send_t() {
    fn takes_sync<S: Sync>(_s: &S) {}
    takes_sync(&SpinMutex::new(0u8));
    takes_sync(&TicketMutex::new(0u8));
}
