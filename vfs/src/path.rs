//! Path resolution over the inode store.
//!
//! [`navigate`] walks a `/`-separated path from the root and reports where
//! it landed as a [`Resolved`] quadruple, traversing symlinks as it goes.
//! The walk keeps a set of every symlink inode it has entered; meeting one
//! again, however long the chain, is `ELOOP`. Beyond that and the empty
//! path, the resolver raises nothing: interpreting a miss is the caller's
//! business, which is what lets one walk serve `stat`, `open(O_CREAT)`,
//! `unlink` and friends alike.
//!
//! Canonicalisation is deliberately shallow: one leading `./` or `../` and
//! the leading slash run are stripped, nothing more. Interior `.` and `..`
//! segments resolve through the real `.`/`..` entries every directory
//! carries, so `/a/../b` literally walks into `a` and back up; no textual
//! simplification happens.

use crate::inode::{InodeKind, InodeStore};
use std::collections::HashSet;
use virtualfs_api::error::{ErrorCode, FsError};
use virtualfs_api::types::Ino;

/// Outcome of walking one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The directory the walk stopped under.
    pub dir: Ino,
    /// The resolved inode, when the full path reached one.
    pub target: Option<Ino>,
    /// The final segment name: the bound target's name, or (with `target`
    /// `None` and `remaining` empty) a free name in `dir` that a create
    /// operation may claim.
    pub name: Option<String>,
    /// Unconsumed suffix, when the walk stopped short of the final
    /// segment (a missing or non-directory intermediate component).
    pub remaining: String,
}

impl Resolved {
    fn bound(dir: Ino, target: Ino, name: Option<String>) -> Resolved {
        Resolved {
            dir,
            target: Some(target),
            name,
            remaining: String::new(),
        }
    }

    fn reserved(dir: Ino, name: String) -> Resolved {
        Resolved {
            dir,
            target: None,
            name: Some(name),
            remaining: String::new(),
        }
    }

    fn unreachable_suffix(dir: Ino, remaining: String) -> Resolved {
        Resolved {
            dir,
            target: None,
            name: None,
            remaining,
        }
    }
}

// Strip a single leading "./" or "../" plus the leading slash run.
pub(crate) fn canonicalize(path: &str) -> &str {
    let path = path
        .strip_prefix("./")
        .or_else(|| path.strip_prefix("../"))
        .unwrap_or(path);
    path.trim_start_matches('/')
}

// First segment and the rest after the slash run. The input never starts
// with '/', so the segment is nonempty.
pub(crate) fn split_first(rest: &str) -> (&str, &str) {
    match rest.find('/') {
        None => (rest, ""),
        Some(at) => (&rest[..at], rest[at..].trim_start_matches('/')),
    }
}

/// Walk `path` from `root`. With `resolve_last` a terminating symlink is
/// followed; without it the symlink itself is bound. Errors: `ENOENT` for
/// the empty path, `ELOOP` when the walk re-enters a symlink.
pub fn navigate(
    store: &InodeStore,
    root: Ino,
    path: &str,
    resolve_last: bool,
) -> Result<Resolved, FsError> {
    if path.is_empty() {
        return Err(FsError::new(ErrorCode::ENOENT, &[path]));
    }
    let mut active = HashSet::new();
    navigate_from(
        store,
        root,
        root,
        canonicalize(path).to_string(),
        resolve_last,
        &mut active,
        path,
    )
}

// Internal variant starting from a caller-supplied directory. `active`
// carries the symlinks already entered by the enclosing top-level walk.
pub(crate) fn navigate_from(
    store: &InodeStore,
    root: Ino,
    start: Ino,
    path: String,
    resolve_last: bool,
    active: &mut HashSet<Ino>,
    orig: &str,
) -> Result<Resolved, FsError> {
    let mut cur = start;
    let mut rest = path;
    loop {
        if rest.is_empty() {
            // only the root (or a symlink collapsing onto a directory)
            // consumes the whole path without a final segment
            return Ok(Resolved::bound(cur, cur, None));
        }
        let (segment, after) = split_first(&rest);
        let segment = segment.to_string();
        let after = after.to_string();

        let found = store.dir_entry(cur, &segment);
        let ino = match found {
            Some(ino) => ino,
            None => {
                return Ok(if after.is_empty() {
                    Resolved::reserved(cur, segment)
                } else {
                    Resolved::unreachable_suffix(cur, after)
                });
            }
        };
        let node = match store.get(ino) {
            Some(node) => node,
            None => return Err(FsError::new(ErrorCode::ENOENT, &[orig])),
        };
        match &node.kind {
            InodeKind::File(_) => {
                return Ok(if after.is_empty() {
                    Resolved::bound(cur, ino, Some(segment))
                } else {
                    Resolved::unreachable_suffix(cur, after)
                });
            }
            InodeKind::Dir(_) => {
                if after.is_empty() {
                    return Ok(Resolved::bound(cur, ino, Some(segment)));
                }
                cur = ino;
                rest = after;
            }
            InodeKind::Symlink(target) => {
                if after.is_empty() && !resolve_last {
                    return Ok(Resolved::bound(cur, ino, Some(segment)));
                }
                if !active.insert(ino) {
                    return Err(FsError::new(ErrorCode::ELOOP, &[orig]));
                }
                let joined = if after.is_empty() {
                    target.clone()
                } else {
                    format!("{}/{}", target, after)
                };
                if joined.starts_with('/') {
                    cur = root;
                    rest = joined.trim_start_matches('/').to_string();
                } else {
                    rest = joined;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{canonicalize, navigate};
    use crate::inode::InodeStore;
    use virtualfs_api::error::ErrorCode;
    use virtualfs_api::types::Ino;

    // root with /a/, /a/f (file) and /top (file)
    fn fixture() -> (InodeStore, Ino, Ino, Ino) {
        let mut store = InodeStore::new();
        let root = store.create_dir(None);
        let a = store.create_dir(Some(root));
        store.add_entry(root, "a", a);
        let f = store.create_file(b"data".to_vec());
        store.add_entry(a, "f", f);
        let top = store.create_file(Vec::new());
        store.add_entry(root, "top", top);
        (store, root, a, f)
    }

    #[test]
    fn canonicalisation_is_shallow() {
        assert_eq!(canonicalize("/a/b"), "a/b");
        assert_eq!(canonicalize("///a"), "a");
        assert_eq!(canonicalize("./a"), "a");
        assert_eq!(canonicalize("../a"), "a");
        // only the first leading dot segment goes
        assert_eq!(canonicalize("././a"), "./a");
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("/"), "");
    }

    #[test]
    fn empty_path_is_enoent() {
        let (store, root, _, _) = fixture();
        assert_eq!(
            navigate(&store, root, "", true).unwrap_err().code,
            ErrorCode::ENOENT
        );
    }

    #[test]
    fn root_binds_to_itself() {
        let (store, root, _, _) = fixture();
        let hit = navigate(&store, root, "/", true).unwrap();
        assert_eq!(hit.target, Some(root));
        assert_eq!(hit.dir, root);
        assert_eq!(hit.name, None);
    }

    #[test]
    fn binds_files_through_directories() {
        let (store, root, a, f) = fixture();
        let hit = navigate(&store, root, "/a/f", true).unwrap();
        assert_eq!(hit.target, Some(f));
        assert_eq!(hit.dir, a);
        assert_eq!(hit.name.as_deref(), Some("f"));

        let hit = navigate(&store, root, "/a//f/", true).unwrap();
        assert_eq!(hit.target, Some(f));
    }

    #[test]
    fn missing_final_segment_reserves_the_name() {
        let (store, root, a, _) = fixture();
        let hit = navigate(&store, root, "/a/new", true).unwrap();
        assert_eq!(hit.target, None);
        assert_eq!(hit.name.as_deref(), Some("new"));
        assert_eq!(hit.dir, a);
        assert_eq!(hit.remaining, "");
    }

    #[test]
    fn missing_intermediate_keeps_the_suffix() {
        let (store, root, _, _) = fixture();
        let hit = navigate(&store, root, "/nope/deep/er", true).unwrap();
        assert_eq!(hit.target, None);
        assert_eq!(hit.name, None);
        assert_eq!(hit.remaining, "deep/er");
    }

    #[test]
    fn walking_through_a_file_stops_short() {
        let (store, root, _, _) = fixture();
        let hit = navigate(&store, root, "/top/below", true).unwrap();
        assert_eq!(hit.target, None);
        assert_eq!(hit.name, None);
        assert_eq!(hit.remaining, "below");
    }

    #[test]
    fn dotdot_walks_the_real_entries() {
        let (store, root, _, f) = fixture();
        // /a/../a/f goes down, up, and down again
        let hit = navigate(&store, root, "/a/../a/f", true).unwrap();
        assert_eq!(hit.target, Some(f));
        // .. at the root points back at the root
        let hit = navigate(&store, root, "/../a/f", true).unwrap();
        assert_eq!(hit.target, Some(f));
    }

    #[test]
    fn symlinks_resolve_transitively() {
        let (mut store, root, a, f) = fixture();
        let l1 = store.create_symlink("/a".to_string());
        store.add_entry(root, "l1", l1);
        let l2 = store.create_symlink("l1/f".to_string());
        store.add_entry(root, "l2", l2);

        let hit = navigate(&store, root, "/l2", true).unwrap();
        assert_eq!(hit.target, Some(f));

        // relative target continues from the containing directory
        let rel = store.create_symlink("f".to_string());
        store.add_entry(a, "rel", rel);
        let hit = navigate(&store, root, "/a/rel", true).unwrap();
        assert_eq!(hit.target, Some(f));
    }

    #[test]
    fn unresolved_last_symlink_binds_itself() {
        let (mut store, root, _, _) = fixture();
        let l = store.create_symlink("/a".to_string());
        store.add_entry(root, "l", l);
        let hit = navigate(&store, root, "/l", false).unwrap();
        assert_eq!(hit.target, Some(l));
    }

    #[test]
    fn dangling_symlink_resolves_to_its_reserved_slot() {
        let (mut store, root, a, _) = fixture();
        let l = store.create_symlink("/a/ghost".to_string());
        store.add_entry(root, "l", l);
        let hit = navigate(&store, root, "/l", true).unwrap();
        assert_eq!(hit.target, None);
        assert_eq!(hit.name.as_deref(), Some("ghost"));
        assert_eq!(hit.dir, a);
    }

    #[test]
    fn self_loop_is_eloop() {
        let (mut store, root, _, _) = fixture();
        let l = store.create_symlink("/x".to_string());
        store.add_entry(root, "x", l);
        assert_eq!(
            navigate(&store, root, "/x", true).unwrap_err().code,
            ErrorCode::ELOOP
        );
    }

    #[test]
    fn two_step_loop_is_eloop() {
        let (mut store, root, a, _) = fixture();
        let x = store.create_symlink("/a/x".to_string());
        store.add_entry(root, "x", x);
        let ax = store.create_symlink("/x".to_string());
        store.add_entry(a, "x", ax);
        assert_eq!(
            navigate(&store, root, "/x/nope", true).unwrap_err().code,
            ErrorCode::ELOOP
        );
    }
}
