#![no_main]

use jarscope::{
    compiler::{CfgCheckPass, Config, PassManager, RemoveGotosPass},
    loader,
    metadata::Scope,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut scope = Scope::new();
    if loader::load_class_bytes(data, &mut scope, None).is_err() {
        return;
    }

    // whatever the loader accepts must survive optimization with a consistent graph
    let mut manager = PassManager::new(Config::default().with_parallel(false))
        .with_pass(RemoveGotosPass::new())
        .with_pass(CfgCheckPass::new());
    let _ = manager.run(&mut scope);
});
