// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Releasing the resources a display list holds.

use crate::list::DisplayList;
use crate::node::NodeCursor;

/// Destroy `list`, releasing every resource reference it holds.
///
/// Dropping a list does the same; this spelling makes the release point
/// explicit at call sites.
pub fn destroy(list: DisplayList) {
    drop(list);
}

/// Walk every node once and release the resources it owns.
///
/// Leaves `list` empty. Returns the number of references released.
pub(crate) fn release_resources(list: &mut DisplayList) -> usize {
    let words = core::mem::take(&mut list.words);
    let mut cursor = NodeCursor::new(&words);
    let mut released = 0;
    while let Some(node) = cursor.next_node(&list.resources) {
        let node = match node {
            Ok(node) => node,
            Err(err) => {
                tracing::warn!(%err, "skipping undecodable node while releasing resources");
                continue;
            }
        };
        for slot in node.owned {
            let resource = list
                .resources
                .get_mut(slot as usize)
                .and_then(Option::take);
            debug_assert!(
                resource.is_some(),
                "{:?} node refers to released resource {slot}",
                node.command
            );
            released += usize::from(resource.is_some());
        }
    }
    debug_assert!(
        list.resources.iter().all(Option::is_none),
        "resource not referenced by any node"
    );
    list.resources.clear();
    list.node_count = 0;
    if released > 0 {
        tracing::debug!(released, "released display list resources");
    }
    released
}
