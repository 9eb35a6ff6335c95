//! End-to-end goto removal tests.
//!
//! Method bodies are written as class file bytes, loaded through the public loader API
//! and optimized with a [`PassManager`], the same way a caller would.

mod common;

use common::{ClassFile, Code};
use jarscope::{
    compiler::{
        CfgCheckPass, Config, PassConfig, PassManager, RemoveGotosPass, METRIC_CFG_ERRORS,
        METRIC_GOTO_REMOVED,
    },
    ir::{Entry, Instruction, InstructionStream, MethodBody, Opcode},
    loader,
    metadata::{ClassDef, MethodAccess, MethodDef, Scope},
};

const STATIC: u16 = 0x0008;

// 0: nop
// 1: goto 5
// 4: return
// 5: nop
// 6: goto 4
const CHAIN: &[u8] = &[0x00, 0xA7, 0x00, 0x04, 0xB1, 0x00, 0xA7, 0xFF, 0xFE];

// 0: iconst_0
// 1: ifeq 8
// 4: nop
// 5: goto 8
// 8: return
const SHARED: &[u8] = &[0x03, 0x99, 0x00, 0x07, 0x00, 0xA7, 0x00, 0x03, 0xB1];

// 0: iconst_0
// 1: ifeq 9
// 4: goto 8
// 7: return
// 8: nop
// 9: return
const FALLTHROUGH: &[u8] = &[0x03, 0x99, 0x00, 0x08, 0xA7, 0x00, 0x04, 0xB1, 0x00, 0xB1];

fn scenario_class() -> Vec<u8> {
    let mut chain = Code::new(CHAIN);
    chain.lines = vec![(0, 10), (5, 11), (4, 12)];

    ClassFile::new("test/Gotos")
        .source_file("Gotos.java")
        .method(STATIC, "chain", "()V", Some(chain))
        .method(STATIC, "shared", "()V", Some(Code::new(SHARED)))
        .method(STATIC, "fallthrough", "()V", Some(Code::new(FALLTHROUGH)))
        .method(0x0401, "abstractMethod", "()V", None)
        .build()
}

fn load() -> Scope {
    common::init_logging();
    let mut scope = Scope::new();
    loader::load_class_bytes(&scenario_class(), &mut scope, None).unwrap();
    scope
}

fn body<'a>(scope: &'a Scope, method: &str) -> &'a MethodBody {
    scope
        .find("test/Gotos")
        .and_then(|class| class.method(method, "()V"))
        .and_then(|method| method.body.as_ref())
        .unwrap()
}

fn opcodes(body: &MethodBody) -> Vec<Opcode> {
    body.stream()
        .iter()
        .filter_map(|(_, entry)| entry.as_instruction().map(|i| i.opcode))
        .collect()
}

fn lines(body: &MethodBody) -> Vec<u32> {
    body.stream()
        .iter()
        .filter_map(|(_, entry)| match entry {
            Entry::Position(position) => Some(position.line),
            _ => None,
        })
        .collect()
}

fn pipeline(parallel: bool) -> PassManager {
    PassManager::new(Config::default().with_parallel(parallel))
        .with_pass(RemoveGotosPass::new())
        .with_pass(CfgCheckPass::new())
}

#[test]
fn scenarios() {
    let mut scope = load();
    let report = pipeline(false).run(&mut scope).unwrap();

    assert_eq!(
        report.metric("RemoveGotosPass", METRIC_GOTO_REMOVED),
        Some(2)
    );
    assert_eq!(report.metric("CfgCheckPass", METRIC_CFG_ERRORS), Some(0));

    // a chain of two jumps collapses into straight-line code
    let chain = body(&scope, "chain");
    assert_eq!(opcodes(chain), [Opcode::Nop, Opcode::Nop, Opcode::Return]);
    assert_eq!(lines(chain), [10, 11, 12]);

    // the join block has two predecessors
    assert_eq!(
        opcodes(body(&scope, "shared")),
        [
            Opcode::Iconst0,
            Opcode::Ifeq,
            Opcode::Nop,
            Opcode::Goto,
            Opcode::Return
        ]
    );

    // the jumped-to block falls through
    assert_eq!(
        opcodes(body(&scope, "fallthrough")),
        [
            Opcode::Iconst0,
            Opcode::Ifeq,
            Opcode::Goto,
            Opcode::Return,
            Opcode::Nop,
            Opcode::Return
        ]
    );
}

#[test]
fn second_run_changes_nothing() {
    let mut scope = load();
    let mut manager = pipeline(false);
    manager.run(&mut scope).unwrap();
    let before = opcodes(body(&scope, "chain"));

    let report = manager.run(&mut scope).unwrap();
    assert_eq!(
        report.metric("RemoveGotosPass", METRIC_GOTO_REMOVED),
        Some(0)
    );
    assert_eq!(opcodes(body(&scope, "chain")), before);
}

#[test]
fn parallel_matches_sequential() {
    let mut sequential = load();
    let mut parallel = load();
    let a = pipeline(false).run(&mut sequential).unwrap();
    let b = pipeline(true).run(&mut parallel).unwrap();

    assert_eq!(
        a.metric("RemoveGotosPass", METRIC_GOTO_REMOVED),
        b.metric("RemoveGotosPass", METRIC_GOTO_REMOVED)
    );
    for method in ["chain", "shared", "fallthrough"] {
        assert_eq!(
            opcodes(body(&sequential, method)),
            opcodes(body(&parallel, method))
        );
    }
}

#[test]
fn protected_code_is_left_alone() {
    let mut stream = InstructionStream::new();
    let region = stream.new_region();
    let exit = stream.new_label();
    stream.push_back(Entry::try_start(region));
    stream.push_back(Entry::Instruction(Instruction::simple(Opcode::Nop)));
    stream.push_back(Entry::Instruction(Instruction::goto(exit)));
    stream.push_back(Entry::try_end(region));
    stream.push_back(Entry::catch(region, None));
    stream.push_back(Entry::Instruction(Instruction::simple(Opcode::Pop)));
    stream.push_back(Entry::Instruction(Instruction::simple(Opcode::Return)));
    stream.push_back(Entry::Target(exit));
    stream.push_back(Entry::Instruction(Instruction::simple(Opcode::Return)));

    let mut class = ClassDef::new("test/Protected");
    class.methods.push(MethodDef {
        owner: class.name.clone(),
        name: "run".to_string(),
        descriptor: "()V".to_string(),
        access: MethodAccess::STATIC,
        body: Some(MethodBody::new(1, 1, stream)),
    });
    let mut scope = Scope::new();
    scope.push(class);

    let report = pipeline(true).run(&mut scope).unwrap();
    assert_eq!(
        report.metric("RemoveGotosPass", METRIC_GOTO_REMOVED),
        Some(0)
    );
    let body = scope.classes()[0].methods[0].body.as_ref().unwrap();
    assert_eq!(body.stream().count_instructions(), 5);
}

#[test]
fn inconsistent_body_stops_the_pipeline() {
    let mut stream = InstructionStream::new();
    let missing = stream.new_label();
    stream.push_back(Entry::Instruction(Instruction::goto(missing)));

    let mut class = ClassDef::new("test/Broken");
    class.methods.push(MethodDef {
        owner: class.name.clone(),
        name: "run".to_string(),
        descriptor: "()V".to_string(),
        access: MethodAccess::STATIC,
        body: Some(MethodBody::new(1, 1, stream)),
    });
    let mut scope = Scope::new();
    scope.push(class);

    let mut manager = PassManager::new(
        Config::default().with_pass_config("CfgCheckPass", PassConfig::new().with("fail_on_error", false)),
    )
    .with_pass(CfgCheckPass::new());
    let report = manager.run(&mut scope).unwrap();
    assert_eq!(report.metric("CfgCheckPass", METRIC_CFG_ERRORS), Some(1));

    assert!(pipeline(false).run(&mut scope).is_err());
}

#[test]
fn builder_option_survives_the_manager() {
    let mut stream = InstructionStream::new();
    let missing = stream.new_label();
    stream.push_back(Entry::Instruction(Instruction::goto(missing)));

    let mut class = ClassDef::new("test/Broken");
    class.methods.push(MethodDef {
        owner: class.name.clone(),
        name: "run".to_string(),
        descriptor: "()V".to_string(),
        access: MethodAccess::STATIC,
        body: Some(MethodBody::new(1, 1, stream)),
    });
    let mut scope = Scope::new();
    scope.push(class);

    let mut manager = PassManager::new(Config::default())
        .with_pass(CfgCheckPass::new().with_fail_on_error(false));
    let report = manager.run(&mut scope).unwrap();
    assert_eq!(report.metric("CfgCheckPass", METRIC_CFG_ERRORS), Some(1));
}
