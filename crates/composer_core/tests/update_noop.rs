use composer_core::{update, ComposerState, Msg};

#[test]
fn update_is_noop() {
    let state = ComposerState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn tick_does_not_mark_dirty() {
    let (mut next, effects) = update(ComposerState::new(), Msg::Tick);

    assert!(!next.consume_dirty());
    assert!(effects.is_empty());
}
