/// Asserts that the provided block panics. The block is wrapped in
/// [`AssertUnwindSafe`](std::panic::AssertUnwindSafe) so that it can borrow collections mutably,
/// which is exactly what the tests need to inspect a collection after a panic.
#[allow(unused_macros)]
macro_rules! assert_panics {
    ($run:block) => {
        assert_panics!($run, "assertion failed to panic")
    };
    ($run:block, $msg:literal) => {
        assert!(
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $run)).is_err(),
            $msg
        );
    };
}

#[allow(unused_imports)]
pub(crate) use assert_panics;
