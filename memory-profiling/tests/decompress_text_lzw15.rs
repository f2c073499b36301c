#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

const LOREM_IPSUM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do \
eiusmod tempor incididunt ut labore et dolore magna aliqua. ";

#[test]
fn decompress_text_lzw15() {
    let text = LOREM_IPSUM.repeat(10_000);
    let compressed = lzw15::compress_to_vec(text.as_bytes());
    let _profiler = dhat::Profiler::builder().testing().build();

    let start_stats = dhat::HeapStats::get();

    let mut decompressed = 0;
    for byte in lzw15::decompress(compressed.iter().copied()) {
        byte.unwrap();
        decompressed += 1;
    }
    assert_eq!(decompressed, text.len());

    let stats = dhat::HeapStats::get();

    println!("{start_stats:?}");
    println!("{stats:?}");
    assert_eq!(stats.curr_bytes, start_stats.curr_bytes);
}
