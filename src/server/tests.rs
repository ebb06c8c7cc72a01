//! Server Module Tests
//!
//! Covers the lazy-edit lifecycle on a single server: acknowledgement,
//! drain-before-read ordering, cache/store interplay logs, and the
//! virtual-node identity rule.

#[cfg(test)]
mod tests {
    use crate::server::protocol::{
        Request, Response, log_evict, log_fault, log_hit, log_lazy_exec, log_miss, msg_created,
        msg_edited, msg_queued,
    };
    use crate::server::queue::{EditTask, TaskQueue, TASK_QUEUE_CAPACITY};
    use crate::server::service::Server;

    fn edit(name: &str, content: &str) -> Request {
        Request::Edit {
            doc_name: name.to_string(),
            doc_content: content.to_string(),
        }
    }

    fn get(name: &str) -> Request {
        Request::Get {
            doc_name: name.to_string(),
        }
    }

    // ============================================================
    // TASK QUEUE
    // ============================================================

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = TaskQueue::new();

        for i in 0..3 {
            assert!(queue.enqueue(EditTask {
                doc_name: format!("doc_{}", i),
                doc_content: "contents".to_string(),
            }));
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dequeue().unwrap().doc_name, "doc_0");
        assert_eq!(queue.dequeue().unwrap().doc_name, "doc_1");
        assert_eq!(queue.dequeue().unwrap().doc_name, "doc_2");
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_queue_rejects_when_full() {
        let mut queue = TaskQueue::with_capacity(2);
        let task = EditTask {
            doc_name: "doc".to_string(),
            doc_content: "contents".to_string(),
        };

        assert!(queue.enqueue(task.clone()));
        assert!(queue.enqueue(task.clone()));
        assert!(!queue.enqueue(task.clone()));
        assert_eq!(queue.len(), 2);

        // Dequeue frees a slot again.
        queue.dequeue();
        assert!(queue.enqueue(task));
    }

    // ============================================================
    // LAZY EDITS
    // ============================================================

    #[test]
    fn test_edit_is_acknowledged_not_applied() {
        let mut server = Server::new(1, 4);
        let mut sink: Vec<Response> = Vec::new();

        let response = server.handle_request(1, edit("alpha", "v1"), &mut sink);

        assert_eq!(response.server_id, 1);
        assert_eq!(response.server_log.as_deref(), Some(log_lazy_exec(1).as_str()));
        assert_eq!(
            response.server_response.as_deref(),
            Some(msg_queued("EDIT", "alpha").as_str())
        );
        // Nothing executed yet: the sink saw no drained responses and the
        // store is still empty.
        assert!(sink.is_empty());
        assert_eq!(server.store_len(), 0);
        assert_eq!(server.pending_edits(), 1);
    }

    #[test]
    fn test_queue_size_is_reported_after_enqueue() {
        let mut server = Server::new(1, 4);
        let mut sink: Vec<Response> = Vec::new();

        for expected in 1..=5 {
            let response = server.handle_request(1, edit("alpha", "v"), &mut sink);
            assert_eq!(
                response.server_log.as_deref(),
                Some(log_lazy_exec(expected).as_str())
            );
        }
    }

    #[test]
    fn test_overflowing_edit_is_dropped_silently() {
        let mut server = Server::new(1, 4);
        let mut sink: Vec<Response> = Vec::new();

        for _ in 0..TASK_QUEUE_CAPACITY {
            server.handle_request(1, edit("alpha", "v"), &mut sink);
        }
        assert_eq!(server.pending_edits(), TASK_QUEUE_CAPACITY);

        // One past capacity: dropped, and the reported size stays put.
        let response = server.handle_request(1, edit("alpha", "v"), &mut sink);
        assert_eq!(server.pending_edits(), TASK_QUEUE_CAPACITY);
        assert_eq!(
            response.server_log.as_deref(),
            Some(log_lazy_exec(TASK_QUEUE_CAPACITY).as_str())
        );
    }

    // ============================================================
    // DRAIN BEFORE READ
    // ============================================================

    #[test]
    fn test_read_drains_queue_in_order() {
        // Cache of two: editing a, b, c must evict a while draining.
        let mut server = Server::new(1, 2);
        let mut sink: Vec<Response> = Vec::new();

        server.handle_request(1, edit("a", "A"), &mut sink);
        server.handle_request(1, edit("b", "B"), &mut sink);
        server.handle_request(1, edit("c", "C"), &mut sink);
        let read = server.handle_request(1, get("c"), &mut sink);

        let drained: Vec<_> = sink
            .iter()
            .map(|r| r.server_log.clone().unwrap())
            .collect();
        assert_eq!(
            drained,
            vec![log_miss("a"), log_miss("b"), log_evict("c", "a")]
        );
        assert_eq!(
            sink.iter()
                .map(|r| r.server_response.clone().unwrap())
                .collect::<Vec<_>>(),
            vec![msg_created("a"), msg_created("b"), msg_created("c")]
        );

        // The read itself hits the freshly cached entry.
        assert_eq!(read.server_log.as_deref(), Some(log_hit("c").as_str()));
        assert_eq!(read.server_response.as_deref(), Some("C"));
        assert_eq!(server.pending_edits(), 0);
    }

    #[test]
    fn test_repeated_edits_apply_in_submission_order() {
        // Cache of one: a is created, edited in place, then evicted by b.
        let mut server = Server::new(1, 1);
        let mut sink: Vec<Response> = Vec::new();

        server.handle_request(1, edit("a", "A1"), &mut sink);
        server.handle_request(1, edit("a", "A2"), &mut sink);
        server.handle_request(1, edit("b", "B"), &mut sink);
        let read = server.handle_request(1, get("a"), &mut sink);

        let drained: Vec<_> = sink
            .iter()
            .map(|r| r.server_log.clone().unwrap())
            .collect();
        assert_eq!(
            drained,
            vec![log_miss("a"), log_hit("a"), log_evict("b", "a")]
        );

        // The read misses the cache (a was evicted), refills it from the
        // store, evicting b in turn, and sees the latest content.
        assert_eq!(
            read.server_log.as_deref(),
            Some(log_evict("a", "b").as_str())
        );
        assert_eq!(read.server_response.as_deref(), Some("A2"));
    }

    #[test]
    fn test_edit_of_stored_document_reports_edited_not_created() {
        let mut server = Server::new(1, 1);
        let mut sink: Vec<Response> = Vec::new();

        // Create a, then push it out of the cache with b. a now lives only
        // in the store.
        server.handle_request(1, edit("a", "A1"), &mut sink);
        server.handle_request(1, edit("b", "B"), &mut sink);
        server.handle_request(1, get("b"), &mut sink);
        sink.clear();

        // Editing a again finds it in the store: MSG_B with a miss/evict
        // log, not MSG_C.
        server.handle_request(1, edit("a", "A2"), &mut sink);
        server.handle_request(1, get("a"), &mut sink);

        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink[0].server_response.as_deref(),
            Some(msg_edited("a").as_str())
        );
        assert_eq!(
            sink[0].server_log.as_deref(),
            Some(log_evict("a", "b").as_str())
        );
    }

    // ============================================================
    // READS
    // ============================================================

    #[test]
    fn test_read_of_unknown_document_faults() {
        let mut server = Server::new(1, 4);
        let mut sink: Vec<Response> = Vec::new();

        let response = server.handle_request(1, get("ghost"), &mut sink);

        assert_eq!(
            response.server_log.as_deref(),
            Some(log_fault("ghost").as_str())
        );
        assert!(response.server_response.is_none());
        assert_eq!(response.server_id, 1);
    }

    #[test]
    fn test_read_your_writes_on_one_server() {
        let mut server = Server::new(1, 2);
        let mut sink: Vec<Response> = Vec::new();

        server.handle_request(1, edit("alpha", "v1"), &mut sink);
        server.handle_request(1, edit("alpha", "v2"), &mut sink);
        let read = server.handle_request(1, get("alpha"), &mut sink);

        assert_eq!(sink.len(), 2, "both edits must execute before the read");
        assert_eq!(read.server_response.as_deref(), Some("v2"));
    }

    #[test]
    fn test_migration_accessors_bypass_cache() {
        let mut server = Server::new(1, 2);
        let mut sink: Vec<Response> = Vec::new();

        server.store_put("alpha", "adopted");
        assert_eq!(server.store_keys(), vec!["alpha".to_string()]);

        // Adopted straight into the store: the first read is a miss.
        let read = server.handle_request(1, get("alpha"), &mut sink);
        assert_eq!(read.server_log.as_deref(), Some(log_miss("alpha").as_str()));
        assert_eq!(read.server_response.as_deref(), Some("adopted"));

        // Invalidate the hot copy; the store still answers.
        server.invalidate_cached("alpha");
        let read = server.handle_request(1, get("alpha"), &mut sink);
        assert_eq!(read.server_log.as_deref(), Some(log_miss("alpha").as_str()));

        server.store_remove("alpha");
        server.invalidate_cached("alpha");
        let read = server.handle_request(1, get("alpha"), &mut sink);
        assert_eq!(
            read.server_log.as_deref(),
            Some(log_fault("alpha").as_str())
        );
    }

    // ============================================================
    // TRANSCRIPT RENDERING
    // ============================================================

    #[test]
    fn test_transcript_renders_two_fixed_lines() {
        use crate::server::protocol::{ResponseSink, TranscriptWriter};

        let mut writer = TranscriptWriter::new(Vec::new());
        writer.deliver(&Response {
            server_log: Some(log_hit("alpha")),
            server_response: Some("document alpha edited successfully".to_string()),
            server_id: 3,
        });

        let rendered = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            rendered,
            "Server 3 has received document alpha edited successfully\n\
             Server 3 has cache entry for alpha\n"
        );
    }

    #[test]
    fn test_transcript_renders_absent_fields_as_empty() {
        use crate::server::protocol::{ResponseSink, TranscriptWriter};

        let mut writer = TranscriptWriter::new(Vec::new());
        writer.deliver(&Response {
            server_log: Some(log_fault("ghost")),
            server_response: None,
            server_id: 7,
        });

        let rendered = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            rendered,
            "Server 7 has received \n\
             Server 7 document ghost is neither in cache, nor in local database\n"
        );
    }

    // ============================================================
    // VIRTUAL-NODE IDENTITY
    // ============================================================

    #[test]
    fn test_responses_carry_the_receiving_identity() {
        let mut server = Server::new(1, 2);
        let mut sink: Vec<Response> = Vec::new();

        // Request arrives through a virtual ring entry of this server.
        let ack = server.handle_request(100001, edit("alpha", "v1"), &mut sink);
        assert_eq!(ack.server_id, 100001);

        let read = server.handle_request(200001, get("alpha"), &mut sink);
        assert_eq!(read.server_id, 200001);
        // The drained edit response also carries the identity of the entry
        // that triggered the drain.
        assert_eq!(sink.last().unwrap().server_id, 200001);
        // State lives on the primary regardless of the identity used.
        assert_eq!(read.server_response.as_deref(), Some("v1"));
    }
}
