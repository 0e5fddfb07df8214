// -*- mode: rust; -*-
//
// This file is part of `snowcone`.
// Copyright © 2024 Galois, Inc.
// See LICENSE for licensing information.

use fhe_traits::Serialize;
use snowcone::{utils::rand_input_set, Error, PsiParams, Receiver, Sender};
use std::time::SystemTime;

const RECEIVER_SIZE: usize = 256;
const SENDER_SIZE: usize = 1024;
const INTERSECTION_SIZE: usize = 64;
const INPUT_BITS: usize = 24;
const MAX_ATTEMPTS: usize = 10;

fn main() {
    env_logger::init();
    let mut rng = rand::rng();

    println!(
        "* Running CLR on {} receiver inputs against {} sender inputs ({} shared)",
        RECEIVER_SIZE, SENDER_SIZE, INTERSECTION_SIZE
    );

    let mut params = PsiParams::with_bfv(
        RECEIVER_SIZE,
        SENDER_SIZE,
        INPUT_BITS,
        4096,
        786433,
        &[50, 55, 55, 55],
    )
    .unwrap();

    let all = rand_input_set(RECEIVER_SIZE + SENDER_SIZE - INTERSECTION_SIZE, INPUT_BITS, &mut rng);
    let receiver_set = all[..RECEIVER_SIZE].to_vec();
    let sender_set = all[RECEIVER_SIZE - INTERSECTION_SIZE..].to_vec();

    for attempt in 1..=MAX_ATTEMPTS {
        params.generate_seeds(&mut rng);

        let total = SystemTime::now();
        let start = SystemTime::now();
        let receiver = Receiver::new(&params, &mut rng).unwrap();
        println!(
            "Receiver :: key generation time: {} ms",
            start.elapsed().unwrap().as_millis()
        );

        let start = SystemTime::now();
        let mut inputs = receiver_set.clone();
        let ciphertexts = match receiver.encrypt_inputs(&params, &mut inputs, &mut rng) {
            Ok(cts) => cts,
            Err(Error::CuckooHashFull) => {
                println!("cuckoo hashing overflowed (attempt {}), retrying", attempt);
                continue;
            }
            Err(e) => panic!("{}", e),
        };
        println!(
            "Receiver :: encryption time: {} ms",
            start.elapsed().unwrap().as_millis()
        );
        let sent: usize = ciphertexts.iter().map(|ct| ct.to_bytes().len()).sum::<usize>()
            + receiver.public_key().to_bytes().len()
            + receiver.relin_key().to_bytes().len();
        println!(
            "Receiver :: communication (write): {:.2} Mb",
            (sent * 8) as f64 / 1e6
        );

        let sender = Sender::new(
            receiver.public_key().clone(),
            receiver.relin_key().clone(),
        );
        let start = SystemTime::now();
        let reply = match sender.compute_matches(&params, &sender_set, &ciphertexts, &mut rng, None)
        {
            Ok(reply) => reply,
            Err(Error::CompleteHashFull { bin }) => {
                println!(
                    "complete hashing overflowed bucket {} (attempt {}), retrying",
                    bin, attempt
                );
                continue;
            }
            Err(e) => panic!("{}", e),
        };
        println!(
            "Sender :: evaluation time: {} ms",
            start.elapsed().unwrap().as_millis()
        );
        let replied: usize = reply.iter().map(|ct| ct.to_bytes().len()).sum();
        println!(
            "Sender :: communication (write): {:.2} Mb",
            (replied * 8) as f64 / 1e6
        );

        let start = SystemTime::now();
        let matches = receiver.decrypt_matches(&params, &reply).unwrap();
        println!(
            "Receiver :: decryption time: {} ms",
            start.elapsed().unwrap().as_millis()
        );
        println!("Total time: {} ms", total.elapsed().unwrap().as_millis());

        let mut matched = matches.iter().map(|&i| inputs[i]).collect::<Vec<u64>>();
        matched.sort_unstable();
        let mut expected = all[RECEIVER_SIZE - INTERSECTION_SIZE..RECEIVER_SIZE].to_vec();
        expected.sort_unstable();
        assert_eq!(matched, expected);
        println!("Intersection of {} elements recovered correctly", matched.len());
        return;
    }

    panic!("hashing kept failing across {} seed refreshes", MAX_ATTEMPTS);
}
