// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent calls always resolve with their own reply, whatever order the
//! gateway answers in.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use proptest::prelude::*;
use serde_json::{Value, json};
use tern_runtime::{ActionClient, Routed};
use tern_test_utils::{MockTransport, frames};

fn answer_in_order(
    client: Arc<ActionClient>,
    mock: MockTransport,
    values: Vec<u32>,
    rotate: usize,
    reverse: bool,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut requests = mock.wait_for_sent(values.len()).await;
        if reverse {
            requests.reverse();
        }
        let len = requests.len();
        requests.rotate_left(rotate % len);
        for request in requests {
            let index = request["params"]["message_id"].as_u64().unwrap() as usize;
            let reply = frames::reply_ok(&request["echo"], json!({"v": values[index]}));
            assert!(matches!(client.route_frame(reply), Routed::Reply));
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn replies_never_cross_wire(
        values in proptest::collection::vec(any::<u32>(), 1..24),
        rotate in 0usize..24,
        reverse in any::<bool>(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let results: Vec<Value> = rt.block_on(async {
            let (transport, mock) = MockTransport::pair();
            let client = Arc::new(ActionClient::new(transport, Duration::from_secs(5)));
            let responder = answer_in_order(client.clone(), mock, values.clone(), rotate, reverse);

            let calls = (0..values.len()).map(|i| {
                let client = client.clone();
                async move { client.call("get_msg", json!({"message_id": i})).await.unwrap() }
            });
            let results = join_all(calls).await;
            responder.await.unwrap();
            assert_eq!(client.pending_count(), 0);
            results
        });

        for (i, result) in results.iter().enumerate() {
            prop_assert_eq!(result["v"].as_u64(), Some(u64::from(values[i])));
        }
    }
}
