//! End-to-end simulation of a WAN-accelerated hop pair: a client talks
//! plaintext to `proxy-a`, which tunnels it encoded over the simulated
//! network to `proxy-b`, which hands plaintext to `server`, which echoes it
//! straight back through both proxies.
//!
//! Exercises the `HELLO` handshake, redundancy-driven `ASK`/`LEARN`
//! exchange, and the orderly `EOS`/`EOS_ACK` shutdown cascading across two
//! independent pipe-pairs, all under turmoil's deterministic scheduler.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use turmoil::net::{TcpListener, TcpStream};
use xcodec_core::{CacheUuid, MemoryCache};
use xcodec_harness::corpus::redundant_corpus;

const PROXY_A_UUID: [u8; xcodec_core::UUID_SIZE] = [1; xcodec_core::UUID_SIZE];
const PROXY_B_UUID: [u8; xcodec_core::UUID_SIZE] = [2; xcodec_core::UUID_SIZE];

#[test]
fn corpus_round_trips_through_two_proxy_hops_with_orderly_shutdown() {
    let mut sim = turmoil::Builder::new().build();
    let corpus = redundant_corpus(0xC0FFEE, 64 * 1024);
    let expected = corpus.clone();

    sim.host("proxy-a", move || async move {
        let listener = TcpListener::bind("0.0.0.0:7890").await?;
        let (interface, _) = listener.accept().await?;
        let peer = TcpStream::connect("proxy-b:9000").await?;

        let cache = MemoryCache::new(CacheUuid::from_bytes(PROXY_A_UUID));
        xcodec_proxy::run_session(0, interface, peer, CacheUuid::from_bytes(PROXY_A_UUID), cache)
            .await?;
        Ok(())
    });

    sim.host("proxy-b", move || async move {
        let wire_listener = TcpListener::bind("0.0.0.0:9000").await?;
        let (peer, _) = wire_listener.accept().await?;
        let interface = TcpStream::connect("server:443").await?;

        let cache = MemoryCache::new(CacheUuid::from_bytes(PROXY_B_UUID));
        xcodec_proxy::run_session(0, interface, peer, CacheUuid::from_bytes(PROXY_B_UUID), cache)
            .await?;
        Ok(())
    });

    sim.host("server", || async {
        let listener = TcpListener::bind("0.0.0.0:443").await?;
        let (mut stream, _) = listener.accept().await?;

        let mut buf = vec![0u8; 8192];
        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            stream.write_all(&buf[..n]).await?;
        }
        stream.shutdown().await?;
        Ok(())
    });

    sim.client("client", async move {
        let stream = TcpStream::connect("proxy-a:7890").await?;
        let (mut read_half, mut write_half) = tokio::io::split(stream);

        let writer = async move {
            write_half.write_all(&corpus).await?;
            write_half.shutdown().await?;
            Ok::<_, std::io::Error>(())
        };

        let reader = async move {
            let mut received = Vec::new();
            read_half.read_to_end(&mut received).await?;
            Ok::<_, std::io::Error>(received)
        };

        let (_, received) = tokio::try_join!(writer, reader)?;
        assert_eq!(received, expected, "echoed corpus must match what the client sent");

        Ok(())
    });

    sim.run().expect("simulation failed");
}
