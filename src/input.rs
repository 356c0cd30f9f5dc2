//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Adding a new keybinding is
//! a single match arm in [`handle_key_event`]; the help text lives in the
//! status bar drawn by [`crate::ui`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Right | KeyCode::Char('n') => app.next_page(),
        KeyCode::Left | KeyCode::Char('p') => app.previous_page(),
        KeyCode::Tab => app.next_topic(),
        KeyCode::BackTab => app.previous_topic(),
        KeyCode::Char('t') => app.next_theme(),
        KeyCode::Char('s') => app.next_sort(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;
    use crate::feed::FeedController;
    use crate::fetch::FetchOutcome;
    use crate::source::Post;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded(n: usize) -> App {
        let mut app = App::new(FeedController::new(FeedConfig::default()));
        app.start();
        let request = app.take_requests().pop().unwrap();
        let posts = (0..n)
            .map(|i| {
                Some(Post {
                    title: Some(format!("post {i}")),
                    ..Post::default()
                })
            })
            .collect();
        app.apply_outcome(FetchOutcome {
            generation: request.generation,
            url: request.url,
            result: Ok(posts),
        });
        app
    }

    #[test]
    fn quit_keys() {
        for code in [KeyCode::Char('q'), KeyCode::Esc] {
            let mut app = loaded(1);
            handle_key_event(&mut app, press(code));
            assert!(app.quit);
        }
    }

    #[test]
    fn ignores_key_release() {
        let mut app = loaded(1);
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key_event(&mut app, release);
        assert!(!app.quit);
    }

    #[test]
    fn movement_keys() {
        let mut app = loaded(5);
        handle_key_event(&mut app, press(KeyCode::Char('j')));
        handle_key_event(&mut app, press(KeyCode::Down));
        assert_eq!(app.selected, 2);
        handle_key_event(&mut app, press(KeyCode::Char('k')));
        assert_eq!(app.selected, 1);
        handle_key_event(&mut app, press(KeyCode::Char('G')));
        assert_eq!(app.selected, 4);
        handle_key_event(&mut app, press(KeyCode::Char('g')));
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn page_keys() {
        let mut app = loaded(45);
        handle_key_event(&mut app, press(KeyCode::Right));
        handle_key_event(&mut app, press(KeyCode::Char('n')));
        assert_eq!(app.feed.current_page(), 3);
        handle_key_event(&mut app, press(KeyCode::Char('p')));
        assert_eq!(app.feed.current_page(), 2);
    }

    #[test]
    fn selection_keys_issue_requests() {
        let mut app = loaded(1);
        handle_key_event(&mut app, press(KeyCode::BackTab));
        assert_eq!(app.feed.active_topic(), "complete");
        assert_eq!(app.take_requests().len(), 1);

        handle_key_event(&mut app, press(KeyCode::Char('t')));
        assert_eq!(app.feed.active_theme(), "givenBirth");
    }

    #[test]
    fn sort_key_cycles_criterion() {
        let mut app = loaded(3);
        handle_key_event(&mut app, press(KeyCode::Char('s')));
        assert_eq!(app.feed.sort().as_str(), "comments_low");
    }

    #[test]
    fn unmapped_keys_do_nothing() {
        let mut app = loaded(3);
        handle_key_event(&mut app, press(KeyCode::Char('x')));
        assert!(!app.quit);
        assert_eq!(app.selected, 0);
        assert!(app.take_requests().is_empty());
    }
}
