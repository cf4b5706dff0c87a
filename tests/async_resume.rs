use std::sync::Arc;
use std::time::Duration;

use dispatchkit::{ChainError, Dispatch, HandlerChain, Outcome, ResumeToken};
use tokio::sync::mpsc;

type Chain = HandlerChain<u32, String, Vec<&'static str>>;

/// `lookup` defers and ships its token to a worker; `render` formats the result.
fn chain_with_worker_queue() -> (Arc<Chain>, mpsc::UnboundedReceiver<ResumeToken>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut chain: Chain = HandlerChain::new();
    chain
        .append_fn("lookup", move |_, cx| {
            cx.context_mut().push("lookup");
            match cx.defer() {
                Ok(token) => {
                    let _ = tx.send(token.clone());
                    Outcome::Deferred(token)
                }
                Err(e) => Outcome::Result(e.to_string()),
            }
        })
        .unwrap();
    chain
        .append_fn("render", |req, cx| {
            cx.context_mut().push("render");
            Outcome::Result(format!("{req}:{}", cx.context().join(">")))
        })
        .unwrap();
    (Arc::new(chain), rx)
}

#[tokio::test]
async fn test_deferred_step_completed_by_another_task() {
    let (chain, mut rx) = chain_with_worker_queue();

    let worker = {
        let chain = Arc::clone(&chain);
        tokio::spawn(async move {
            let token = rx.recv().await.expect("token");
            tokio::time::sleep(Duration::from_millis(10)).await;
            chain.resume(token, Outcome::Continue)
        })
    };

    let first = chain.dispatch(7, Vec::new()).unwrap();
    assert!(first.is_suspended());

    let resumed = worker.await.unwrap().unwrap();
    assert_eq!(resumed, Dispatch::Handled("7:lookup>render".to_string()));
    assert_eq!(chain.pending(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatches_resume_independently() {
    let (chain, mut rx) = chain_with_worker_queue();

    for n in 0..8 {
        assert!(chain.dispatch(n, Vec::new()).unwrap().is_suspended());
    }
    assert_eq!(chain.pending(), 8);

    let mut joins = Vec::new();
    while let Ok(token) = rx.try_recv() {
        let chain = Arc::clone(&chain);
        joins.push(tokio::spawn(async move { chain.resume(token, Outcome::Continue) }));
    }

    let mut rendered = Vec::new();
    for j in joins {
        if let Dispatch::Handled(s) = j.await.unwrap().unwrap() {
            rendered.push(s);
        }
    }
    rendered.sort();
    assert_eq!(rendered.len(), 8);
    assert_eq!(rendered[0], "0:lookup>render");
    assert_eq!(chain.pending(), 0);
}

#[tokio::test]
async fn test_second_resume_from_another_task_is_stale() {
    let (chain, mut rx) = chain_with_worker_queue();
    assert!(chain.dispatch(1, Vec::new()).unwrap().is_suspended());
    let token = rx.recv().await.unwrap();

    let a = {
        let chain = Arc::clone(&chain);
        let token = token.clone();
        tokio::spawn(async move { chain.resume(token, Outcome::Result("early".into())) })
    };
    let first = a.await.unwrap().unwrap();
    assert_eq!(first, Dispatch::Handled("early".to_string()));

    let again = chain.resume(token.clone(), Outcome::Continue);
    assert_eq!(again, Err(ChainError::StaleToken { dispatch: token.dispatch_id() }));
}
