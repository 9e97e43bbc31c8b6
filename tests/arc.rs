// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(feature = "arc")]

use lazy_static::lazy_static;

use qval::*;

// Ensure that values, types and engines can be shared across threads.
lazy_static! {
    static ref VALUE: Value = Value::NULL;
    static ref ENGINE: Engine = Engine::new();
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn shared_engine() -> anyhow::Result<()> {
    assert_send_sync::<Value>();
    assert_send_sync::<TypeDescriptor>();
    assert_send_sync::<Ref<Expr>>();
    assert_send_sync::<Engine>();

    ENGINE.register_type("SHARED_NUMBER", &["INT", "DECIMAL"])?;
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || -> qval::Result<bool> {
                let t = ENGINE.compile_type("shared_number")?;
                ENGINE.can_cast(&Value::from(i), &t)
            })
        })
        .collect();
    for h in handles {
        let joined = h.join().map_err(|_| anyhow::anyhow!("thread panicked"))?;
        assert!(joined?);
    }
    assert!(VALUE.is_null());
    Ok(())
}
